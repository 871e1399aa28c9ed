use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::user::AvatarInfo;
use crate::schema::{self, ProfileChanges};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    pub id: i32,
    pub user: i32,
    pub username: String,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub show_age: bool,
    pub about_me: Option<String>,
    pub favorite_books: Option<String>,
    pub favorite_movies: Option<String>,
    pub favorite_music: Option<String>,
    pub picture: Option<AvatarInfo>,
    pub create_date: NaiveDateTime,
    pub update_date: Option<NaiveDateTime>,
}

impl ProfileInfo {
    pub fn new(profile: schema::Profile, picture: Option<AvatarInfo>) -> Self {
        Self {
            id: profile.id,
            user: profile.user_id,
            username: profile.username,
            name: profile.name,
            gender: profile.gender,
            birthday: profile.birthday,
            show_age: profile.show_age,
            about_me: profile.about_me,
            favorite_books: profile.favorite_books,
            favorite_movies: profile.favorite_movies,
            favorite_music: profile.favorite_music,
            picture,
            create_date: profile.create_date,
            update_date: profile.update_date,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateModel {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub show_age: Option<bool>,
    pub about_me: Option<String>,
    pub favorite_books: Option<String>,
    pub favorite_movies: Option<String>,
    pub favorite_music: Option<String>,
}

impl ProfileUpdateModel {
    /// Empty strings count as "not supplied" and leave the stored value alone.
    pub fn into_changes(self) -> ProfileChanges {
        fn supplied(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        ProfileChanges {
            name: supplied(self.name),
            gender: supplied(self.gender),
            birthday: self.birthday,
            show_age: self.show_age,
            about_me: supplied(self.about_me),
            favorite_books: supplied(self.favorite_books),
            favorite_movies: supplied(self.favorite_movies),
            favorite_music: supplied(self.favorite_music),
            update_date: None,
        }
    }
}

/// Every supplied criterion must match as a case-insensitive substring.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSearchModel {
    pub username: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub about_me: Option<String>,
    pub favorites: Option<String>,
    pub page: Option<i64>,
}
