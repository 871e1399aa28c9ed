use chrono::NaiveDateTime;
use diesel::prelude::*;

table! {
    users {
        id -> Integer,
        username -> Text,
        email -> Text,
        role -> Text,
        uid -> Text,
        avatar -> Nullable<Integer>,
        create_date -> Timestamp,
        last_online -> Timestamp,
    }
}

table! {
    credentials (uid) {
        uid -> Text,
        email -> Text,
        password_hash -> Text,
    }
}

table! {
    profiles {
        id -> Integer,
        user_id -> Integer,
        username -> Text,
        name -> Nullable<Text>,
        gender -> Nullable<Text>,
        birthday -> Nullable<Date>,
        show_age -> Bool,
        about_me -> Nullable<Text>,
        favorite_books -> Nullable<Text>,
        favorite_movies -> Nullable<Text>,
        favorite_music -> Nullable<Text>,
        picture -> Nullable<Integer>,
        create_date -> Timestamp,
        update_date -> Nullable<Timestamp>,
    }
}

table! {
    images {
        id -> Integer,
        user_id -> Integer,
        url_full -> Text,
        url_175 -> Nullable<Text>,
        url_80 -> Nullable<Text>,
        filetype -> Nullable<Text>,
        height -> Nullable<Text>,
        width -> Nullable<Text>,
        filesize -> Nullable<Text>,
        create_date -> Timestamp,
    }
}

table! {
    posts {
        id -> Integer,
        user_id -> Integer,
        profile_id -> Integer,
        text -> Text,
        date -> Timestamp,
    }
}

table! {
    post_comments {
        id -> Integer,
        post_id -> Integer,
        user_id -> Integer,
        text -> Text,
        date -> Timestamp,
    }
}

table! {
    messages {
        id -> Integer,
        from_user -> Integer,
        to_user -> Integer,
        subject -> Text,
        text -> Text,
        read -> Integer,
        date -> Timestamp,
    }
}

table! {
    message_comments {
        id -> Integer,
        message_id -> Integer,
        user_id -> Integer,
        text -> Text,
        date -> Timestamp,
    }
}

table! {
    notifications {
        id -> Integer,
        user_id -> Integer,
        text -> Text,
        kind -> Integer,
        date -> Timestamp,
    }
}

table! {
    friendships {
        id -> Integer,
        user1 -> Integer,
        user2 -> Integer,
        status -> Integer,
        create_date -> Timestamp,
    }
}

joinable!(profiles -> users (user_id));
joinable!(posts -> users (user_id));
joinable!(post_comments -> users (user_id));
joinable!(message_comments -> users (user_id));
joinable!(notifications -> users (user_id));

allow_tables_to_appear_in_same_query!(
    users,
    credentials,
    profiles,
    images,
    posts,
    post_comments,
    messages,
    message_comments,
    notifications,
    friendships,
);

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(primary_key(id))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub uid: String,
    pub avatar: Option<i32>,
    pub create_date: NaiveDateTime,
    pub last_online: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub role: &'a str,
    pub uid: &'a str,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = profiles)]
#[diesel(primary_key(id))]
pub struct Profile {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<chrono::NaiveDate>,
    pub show_age: bool,
    pub about_me: Option<String>,
    pub favorite_books: Option<String>,
    pub favorite_movies: Option<String>,
    pub favorite_music: Option<String>,
    pub picture: Option<i32>,
    pub create_date: NaiveDateTime,
    pub update_date: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile<'a> {
    pub user_id: i32,
    pub username: &'a str,
}

/// Only the `Some` fields are written by an update.
#[derive(AsChangeset, Default)]
#[diesel(table_name = profiles)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<chrono::NaiveDate>,
    pub show_age: Option<bool>,
    pub about_me: Option<String>,
    pub favorite_books: Option<String>,
    pub favorite_movies: Option<String>,
    pub favorite_music: Option<String>,
    pub update_date: Option<NaiveDateTime>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.gender.is_none()
            && self.birthday.is_none()
            && self.show_age.is_none()
            && self.about_me.is_none()
            && self.favorite_books.is_none()
            && self.favorite_movies.is_none()
            && self.favorite_music.is_none()
            && self.update_date.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = images)]
#[diesel(primary_key(id))]
pub struct Image {
    pub id: i32,
    pub user_id: i32,
    pub url_full: String,
    pub url_175: Option<String>,
    pub url_80: Option<String>,
    pub filetype: Option<String>,
    pub height: Option<String>,
    pub width: Option<String>,
    pub filesize: Option<String>,
    pub create_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = images)]
pub struct NewImage<'a> {
    pub user_id: i32,
    pub url_full: &'a str,
    pub url_175: Option<&'a str>,
    pub url_80: Option<&'a str>,
    pub filetype: Option<&'a str>,
    pub height: Option<&'a str>,
    pub width: Option<&'a str>,
    pub filesize: Option<&'a str>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = posts)]
#[diesel(primary_key(id))]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub profile_id: i32,
    pub text: String,
    pub date: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = post_comments)]
#[diesel(primary_key(id))]
pub struct PostComment {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub text: String,
    pub date: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = messages)]
#[diesel(primary_key(id))]
pub struct Message {
    pub id: i32,
    pub from_user: i32,
    pub to_user: i32,
    pub subject: String,
    pub text: String,
    pub read: i32,
    pub date: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = message_comments)]
#[diesel(primary_key(id))]
pub struct MessageComment {
    pub id: i32,
    pub message_id: i32,
    pub user_id: i32,
    pub text: String,
    pub date: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = notifications)]
#[diesel(primary_key(id))]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub text: String,
    pub kind: i32,
    pub date: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = friendships)]
#[diesel(primary_key(id))]
pub struct FriendshipRow {
    pub id: i32,
    pub user1: i32,
    pub user2: i32,
    pub status: i32,
    pub create_date: NaiveDateTime,
}
