pub mod credential;
pub mod ignored;
pub mod session;
pub mod team_member;
pub mod user;
pub mod user_project;

pub use credential::CredentialRepository;
pub use ignored::IgnoreListRepository;
pub use session::SessionRepository;
pub use team_member::TeamMemberRepository;
pub use user::UserRepository;
pub use user_project::UserProjectRepository;
