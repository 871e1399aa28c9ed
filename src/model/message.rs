use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{post::CommentInfo, user::UserSummary};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: i32,
    pub from: Option<UserSummary>,
    pub to: i32,
    pub subject: String,
    pub text: String,
    pub read: i32,
    pub comments: Vec<CommentInfo>,
    pub date: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageModel {
    pub to: i32,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
}
