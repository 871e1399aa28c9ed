use std::collections::HashMap;

use actix::Addr;
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use validator::Validate;

use super::stream::{publish, LiveServer};
use crate::{
    auth::AuthUser,
    error::AppError,
    friendship,
    model::{
        live::LiveEventKind,
        message::{MessageInfo, SendMessageModel},
        post::{CommentInfo, CommentModel},
    },
    schema::{self, Message, MessageComment},
    state::AppState,
    store::pg::load_summaries,
    DbPool,
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(send));
    cfg.route("", web::get().to(inbox));
    cfg.route("/single/{message_id}", web::get().to(single));
    cfg.route("/comment/{message_id}", web::post().to(comment));
    cfg.route("/read/{message_id}", web::post().to(set_read));
}

fn not_yours() -> AppError {
    AppError::not_permitted("This is not your message.")
}

/// Loads a message the caller sent or received.
fn find_own(conn: &mut PgConnection, message_id: i32, user: i32) -> Result<Message, AppError> {
    use schema::messages::dsl::*;

    messages
        .find(message_id)
        .first::<Message>(conn)
        .optional()?
        .filter(|m| m.from_user == user || m.to_user == user)
        .ok_or_else(not_yours)
}

fn expand(conn: &mut PgConnection, list: Vec<Message>) -> QueryResult<Vec<MessageInfo>> {
    use schema::message_comments::dsl::*;

    let ids = list.iter().map(|m| m.id).collect::<Vec<_>>();
    let rows = message_comments
        .filter(message_id.eq_any(ids))
        .order((date.desc(), id.desc()))
        .load::<MessageComment>(conn)?;

    let mut people = list.iter().map(|m| m.from_user).collect::<Vec<_>>();
    people.extend(rows.iter().map(|c| c.user_id));
    people.sort_unstable();
    people.dedup();
    let summaries = load_summaries(conn, &people)?;

    let mut by_message: HashMap<i32, Vec<CommentInfo>> = HashMap::new();
    for row in rows {
        by_message.entry(row.message_id).or_default().push(CommentInfo {
            id: row.id,
            user: summaries.get(&row.user_id).cloned(),
            text: row.text,
            date: row.date,
        });
    }

    Ok(list
        .into_iter()
        .map(|m| MessageInfo {
            id: m.id,
            from: summaries.get(&m.from_user).cloned(),
            to: m.to_user,
            comments: by_message.remove(&m.id).unwrap_or_default(),
            subject: m.subject,
            text: m.text,
            read: m.read,
            date: m.date,
        })
        .collect())
}

fn expand_one(conn: &mut PgConnection, message: Message) -> Result<MessageInfo, AppError> {
    expand(conn, vec![message])?.pop().ok_or_else(not_yours)
}

/// Only friends may message each other.
pub async fn send(
    web::Json(model): web::Json<SendMessageModel>,
    user: AuthUser,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    live: web::Data<Addr<LiveServer>>,
) -> Result<HttpResponse, AppError> {
    model.validate()?;
    let message = web::block(move || -> Result<MessageInfo, AppError> {
        use schema::messages::dsl::*;

        if !friendship::are_friends(state.friendships.as_ref(), user.id, model.to)? {
            return Err(AppError::not_permitted("Users are not friends."));
        }
        let mut conn = pool.get()?;
        let created = diesel::insert_into(messages)
            .values((
                from_user.eq(user.id),
                to_user.eq(model.to),
                subject.eq(&model.subject),
                text.eq(&model.text),
            ))
            .get_result::<Message>(&mut conn)?;
        expand_one(&mut conn, created)
    })
    .await??;
    publish(&live, message.to, LiveEventKind::Message, &message);
    Ok(HttpResponse::Ok().json(message))
}

pub async fn inbox(user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let list = web::block(move || -> Result<Vec<MessageInfo>, AppError> {
        use schema::messages::dsl::*;

        let mut conn = pool.get()?;
        let received = messages
            .filter(to_user.eq(user.id))
            .order((date.desc(), id.desc()))
            .load::<Message>(&mut conn)?;
        Ok(expand(&mut conn, received)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn single(path: web::Path<i32>, user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let message_id = path.into_inner();
    let message = web::block(move || -> Result<MessageInfo, AppError> {
        let mut conn = pool.get()?;
        let message = find_own(&mut conn, message_id, user.id)?;
        expand_one(&mut conn, message)
    })
    .await??;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn comment(
    path: web::Path<i32>,
    web::Json(model): web::Json<CommentModel>,
    user: AuthUser,
    pool: web::Data<DbPool>,
    live: web::Data<Addr<LiveServer>>,
) -> Result<HttpResponse, AppError> {
    model.validate()?;
    let message_id = path.into_inner();
    let message = web::block(move || -> Result<MessageInfo, AppError> {
        use schema::message_comments;

        let mut conn = pool.get()?;
        let message = find_own(&mut conn, message_id, user.id)?;
        diesel::insert_into(message_comments::table)
            .values((
                message_comments::message_id.eq(message.id),
                message_comments::user_id.eq(user.id),
                message_comments::text.eq(&model.text),
            ))
            .execute(&mut conn)?;
        expand_one(&mut conn, message)
    })
    .await??;

    let counterpart = match message.from.as_ref().map(|f| f.id) {
        Some(sender) if sender != user.id => sender,
        _ => message.to,
    };
    if counterpart != user.id {
        publish(&live, counterpart, LiveEventKind::Message, &message);
    }
    Ok(HttpResponse::Ok().json(message))
}

/// Marks a received message as read.
pub async fn set_read(path: web::Path<i32>, user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let message = path.into_inner();
    let updated = web::block(move || -> Result<MessageInfo, AppError> {
        use schema::messages::dsl::*;

        let mut conn = pool.get()?;
        let marked = diesel::update(messages.filter(id.eq(message).and(to_user.eq(user.id))))
            .set(read.eq(1))
            .get_result::<Message>(&mut conn)
            .optional()?
            .ok_or_else(not_yours)?;
        expand_one(&mut conn, marked)
    })
    .await??;
    Ok(HttpResponse::Ok().json(updated))
}
