use chrono::NaiveDateTime;
use serde::Serialize;

use super::user::UserSummary;

/// A pending request as shown to its recipient.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestInfo {
    pub id: i32,
    pub user1: UserSummary,
    pub create_date: NaiveDateTime,
}
