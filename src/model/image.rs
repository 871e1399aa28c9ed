use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schema::Image;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewImageModel {
    #[serde(default)]
    #[validate(length(min = 1, message = "Image url is required"))]
    pub url_full: String,
    pub url_175: Option<String>,
    pub url_80: Option<String>,
    pub filetype: Option<String>,
    pub height: Option<String>,
    pub width: Option<String>,
    pub filesize: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub id: i32,
    pub user: i32,
    pub url_full: String,
    pub url_175: Option<String>,
    pub url_80: Option<String>,
    pub filetype: Option<String>,
    pub height: Option<String>,
    pub width: Option<String>,
    pub filesize: Option<String>,
    pub create_date: chrono::NaiveDateTime,
}

impl From<Image> for ImageInfo {
    fn from(image: Image) -> Self {
        Self {
            id: image.id,
            user: image.user_id,
            url_full: image.url_full,
            url_175: image.url_175,
            url_80: image.url_80,
            filetype: image.filetype,
            height: image.height,
            width: image.width,
            filesize: image.filesize,
            create_date: image.create_date,
        }
    }
}
