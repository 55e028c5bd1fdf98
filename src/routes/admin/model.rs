use serde::Deserialize;

use crate::database::UserStatus;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub status: Option<UserStatus>,
}
