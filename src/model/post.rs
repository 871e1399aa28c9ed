use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::UserSummary;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentInfo {
    pub id: i32,
    pub user: Option<UserSummary>,
    pub text: String,
    pub date: NaiveDateTime,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostInfo {
    pub id: i32,
    pub user: Option<UserSummary>,
    pub profile: i32,
    pub text: String,
    pub comments: Vec<CommentInfo>,
    pub date: NaiveDateTime,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPostModel {
    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
    pub profile_id: i32,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentModel {
    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
}
