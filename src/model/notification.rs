use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schema::Notification;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewNotificationModel {
    pub user: i32,
    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: i32,
}

fn default_kind() -> i32 {
    1
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationInfo {
    pub id: i32,
    pub user: i32,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub date: chrono::NaiveDateTime,
}

impl From<Notification> for NotificationInfo {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            user: n.user_id,
            text: n.text,
            kind: n.kind,
            date: n.date,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<NotificationInfo>,
    pub total_pages: i64,
    pub current_page: i64,
}

pub fn total_pages(count: i64, limit: i64) -> i64 {
    count / limit + (count % limit != 0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, i64::MAX), 1);
        assert_eq!(total_pages(i64::MAX, 10), i64::MAX / 10 + 1);
    }

    #[test]
    fn type_defaults_to_one() {
        let model: NewNotificationModel =
            serde_json::from_str(r#"{"user":3,"text":"hi"}"#).unwrap();
        assert_eq!(model.kind, 1);
    }
}
