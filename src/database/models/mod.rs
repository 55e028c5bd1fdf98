pub mod credential;
pub mod ignored;
pub mod session;
pub mod team_member;
pub mod user;
pub mod user_project;

pub use credential::CredentialEntity;
pub use ignored::IgnoredTicketEntity;
pub use session::SessionEntity;
pub use team_member::{NewTeamMember, TeamMemberEntity};
pub use user::{UserEntity, UserRole, UserStatus};
pub use user_project::{TrackedBoard, TrackedProject, UserProjectEntity};
