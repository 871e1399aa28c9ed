use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{auth::Role, schema};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvatarInfo {
    pub id: i32,
    pub url_full: String,
    pub url_175: Option<String>,
    pub url_80: Option<String>,
}

/// The public face of a user as embedded in other resources.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub avatar: Option<AvatarInfo>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub avatar: Option<AvatarInfo>,
    pub create_date: NaiveDateTime,
    pub last_online: NaiveDateTime,
}

impl UserInfo {
    pub fn new(user: schema::User, avatar: Option<AvatarInfo>) -> Self {
        Self {
            id: user.id,
            role: Role::parse(&user.role),
            username: user.username,
            avatar,
            create_date: user.create_date,
            last_online: user.last_online,
        }
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterModel {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Please enter a password with 6 or more characters"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginModel {
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordModel {
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn register_reports_all_violations() {
        let model: RegisterModel =
            serde_json::from_str(r#"{"email":"nope","password":"123"}"#).unwrap();
        match AppError::from(model.validate().unwrap_err()) {
            AppError::Validation(messages) => assert_eq!(
                messages,
                vec![
                    "Please include a valid email",
                    "Please enter a password with 6 or more characters",
                    "Username is required",
                ]
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn well_formed_registration_passes() {
        let model: RegisterModel = serde_json::from_str(
            r#"{"username":"alice","email":"alice@example.com","password":"secret1"}"#,
        )
        .unwrap();
        assert!(model.validate().is_ok());
    }

    #[test]
    fn login_requires_password() {
        let model: LoginModel =
            serde_json::from_str(r#"{"email":"alice@example.com"}"#).unwrap();
        assert!(model.validate().is_err());
    }
}
