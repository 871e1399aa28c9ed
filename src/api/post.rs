use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use tracing::info;
use validator::Validate;

use crate::{
    auth::{AuthUser, ModeratorUser},
    error::AppError,
    model::{
        post::{CommentInfo, CommentModel, NewPostModel, PostInfo},
        MsgModel,
    },
    schema::{self, Post, PostComment},
    store::pg::load_summaries,
    DbPool,
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create));
    cfg.route("/profile/{profile_id}", web::get().to(by_profile));
    cfg.route("/comment/{post_id}", web::post().to(comment));
    cfg.route("/comment/{post_id}/{comment_id}", web::delete().to(delete_comment));
    cfg.route("/moderate/{id}", web::delete().to(moderate));
    cfg.route("/{id}", web::get().to(get));
    cfg.route("/{id}", web::delete().to(delete));
}

fn post_not_found() -> AppError {
    AppError::not_found("Post not found")
}

fn find_post(conn: &mut PgConnection, post_id: i32) -> QueryResult<Option<Post>> {
    use schema::posts::dsl::*;

    posts.find(post_id).first::<Post>(conn).optional()
}

/// Attaches comments (newest first) and author summaries to `list`.
fn expand(conn: &mut PgConnection, list: Vec<Post>) -> QueryResult<Vec<PostInfo>> {
    use schema::post_comments::dsl::*;

    let ids = list.iter().map(|p| p.id).collect::<Vec<_>>();
    let rows = post_comments
        .filter(post_id.eq_any(ids))
        .order((date.desc(), id.desc()))
        .load::<PostComment>(conn)?;

    let mut authors = list.iter().map(|p| p.user_id).collect::<Vec<_>>();
    authors.extend(rows.iter().map(|c| c.user_id));
    authors.sort_unstable();
    authors.dedup();
    let summaries = load_summaries(conn, &authors)?;

    let mut by_post: HashMap<i32, Vec<CommentInfo>> = HashMap::new();
    for row in rows {
        by_post.entry(row.post_id).or_default().push(CommentInfo {
            id: row.id,
            user: summaries.get(&row.user_id).cloned(),
            text: row.text,
            date: row.date,
        });
    }

    Ok(list
        .into_iter()
        .map(|p| PostInfo {
            id: p.id,
            user: summaries.get(&p.user_id).cloned(),
            profile: p.profile_id,
            comments: by_post.remove(&p.id).unwrap_or_default(),
            text: p.text,
            date: p.date,
        })
        .collect())
}

fn expand_one(conn: &mut PgConnection, post: Post) -> Result<PostInfo, AppError> {
    expand(conn, vec![post])?
        .pop()
        .ok_or_else(post_not_found)
}

pub async fn create(
    web::Json(model): web::Json<NewPostModel>,
    user: AuthUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    model.validate()?;
    let post = web::block(move || -> Result<PostInfo, AppError> {
        use schema::{posts, profiles};

        let mut conn = pool.get()?;
        let profile = profiles::table
            .find(model.profile_id)
            .select(profiles::id)
            .first::<i32>(&mut conn)
            .optional()?;
        if profile.is_none() {
            return Err(AppError::not_found("Profile not found"));
        }
        let created = diesel::insert_into(posts::table)
            .values((
                posts::user_id.eq(user.id),
                posts::profile_id.eq(model.profile_id),
                posts::text.eq(&model.text),
            ))
            .get_result::<Post>(&mut conn)?;
        expand_one(&mut conn, created)
    })
    .await??;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn by_profile(path: web::Path<i32>, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let profile = path.into_inner();
    let list = web::block(move || -> Result<Vec<PostInfo>, AppError> {
        use schema::posts::dsl::*;

        let mut conn = pool.get()?;
        let found = posts
            .filter(profile_id.eq(profile))
            .order((date.desc(), id.desc()))
            .load::<Post>(&mut conn)?;
        Ok(expand(&mut conn, found)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn get(path: web::Path<i32>, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let post = web::block(move || -> Result<PostInfo, AppError> {
        let mut conn = pool.get()?;
        let post = find_post(&mut conn, post_id)?.ok_or_else(post_not_found)?;
        expand_one(&mut conn, post)
    })
    .await??;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn comment(
    path: web::Path<i32>,
    web::Json(model): web::Json<CommentModel>,
    user: AuthUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    model.validate()?;
    let post_id = path.into_inner();
    let post = web::block(move || -> Result<PostInfo, AppError> {
        use schema::post_comments;

        let mut conn = pool.get()?;
        let post = find_post(&mut conn, post_id)?.ok_or_else(post_not_found)?;
        diesel::insert_into(post_comments::table)
            .values((
                post_comments::post_id.eq(post.id),
                post_comments::user_id.eq(user.id),
                post_comments::text.eq(&model.text),
            ))
            .execute(&mut conn)?;
        expand_one(&mut conn, post)
    })
    .await??;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete(path: web::Path<i32>, user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    web::block(move || -> Result<(), AppError> {
        use schema::posts;

        let mut conn = pool.get()?;
        let post = find_post(&mut conn, post_id)?.ok_or_else(post_not_found)?;
        if post.user_id != user.id {
            return Err(AppError::Unauthorized("User not authorized".to_string()));
        }
        diesel::delete(posts::table.find(post.id)).execute(&mut conn)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::Ok().json(MsgModel::new("Post removed")))
}

pub async fn moderate(
    path: web::Path<i32>,
    moderator: ModeratorUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let removed = web::block(move || -> Result<usize, AppError> {
        use schema::posts::dsl::*;

        let mut conn = pool.get()?;
        Ok(diesel::delete(posts.find(post_id)).execute(&mut conn)?)
    })
    .await??;
    if removed == 0 {
        return Err(post_not_found());
    }
    info!(moderator = moderator.id, post_id, "moderator removed post");
    Ok(HttpResponse::Ok().json(MsgModel::new("Post removed")))
}

/// Answers with the post's remaining comments.
pub async fn delete_comment(
    path: web::Path<(i32, i32)>,
    user: AuthUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let (post, comment) = path.into_inner();
    let remaining = web::block(move || -> Result<Vec<CommentInfo>, AppError> {
        use schema::post_comments::dsl::*;

        let mut conn = pool.get()?;
        let target = find_post(&mut conn, post)?.ok_or_else(post_not_found)?;
        let author = post_comments
            .filter(id.eq(comment).and(post_id.eq(target.id)))
            .select(user_id)
            .first::<i32>(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        if author != user.id {
            return Err(AppError::Unauthorized("User not authorized".to_string()));
        }
        diesel::delete(post_comments.find(comment)).execute(&mut conn)?;
        Ok(expand_one(&mut conn, target)?.comments)
    })
    .await??;
    Ok(HttpResponse::Ok().json(remaining))
}
