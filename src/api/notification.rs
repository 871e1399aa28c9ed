use actix::Addr;
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use validator::Validate;

use super::stream::{publish, LiveServer};
use crate::{
    auth::AuthUser,
    error::AppError,
    model::{
        live::LiveEventKind,
        notification::{total_pages, NewNotificationModel, NotificationInfo, NotificationPage},
        MsgModel, PageModel,
    },
    schema::{self, Notification},
    DbPool,
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create));
    cfg.route("/get", web::get().to(list));
    cfg.route("/notification/{id}", web::delete().to(delete_one));
    cfg.route("/notifications", web::delete().to(delete_all));
}

pub async fn create(
    web::Json(model): web::Json<NewNotificationModel>,
    _user: AuthUser,
    pool: web::Data<DbPool>,
    live: web::Data<Addr<LiveServer>>,
) -> Result<HttpResponse, AppError> {
    model.validate()?;
    let created = web::block(move || -> Result<Notification, AppError> {
        use schema::{notifications, users};

        let mut conn = pool.get()?;
        let target = users::table
            .find(model.user)
            .select(users::id)
            .first::<i32>(&mut conn)
            .optional()?;
        if target.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        Ok(diesel::insert_into(notifications::table)
            .values((
                notifications::user_id.eq(model.user),
                notifications::text.eq(&model.text),
                notifications::kind.eq(model.kind),
            ))
            .get_result::<Notification>(&mut conn)?)
    })
    .await??;

    let info = NotificationInfo::from(created);
    publish(&live, info.user, LiveEventKind::Notification, &info);
    Ok(HttpResponse::Ok().json(info))
}

/// Newest first, one page at a time.
pub async fn list(
    web::Query(paging): web::Query<PageModel>,
    user: AuthUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = (paging.page(), paging.limit());
    let offset = paging.offset();
    let (found, count) = web::block(move || -> Result<(Vec<Notification>, i64), AppError> {
        use schema::notifications::dsl::*;

        let mut conn = pool.get()?;
        let found = notifications
            .filter(user_id.eq(user.id))
            .order((date.desc(), id.desc()))
            .offset(offset)
            .limit(limit)
            .load::<Notification>(&mut conn)?;
        let count = notifications
            .filter(user_id.eq(user.id))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok((found, count))
    })
    .await??;

    Ok(HttpResponse::Ok().json(NotificationPage {
        notifications: found.into_iter().map(NotificationInfo::from).collect(),
        total_pages: total_pages(count, limit),
        current_page: page,
    }))
}

pub async fn delete_one(
    path: web::Path<i32>,
    user: AuthUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let notification = path.into_inner();
    let removed = web::block(move || -> Result<usize, AppError> {
        use schema::notifications::dsl::*;

        let mut conn = pool.get()?;
        Ok(diesel::delete(notifications.filter(id.eq(notification).and(user_id.eq(user.id))))
            .execute(&mut conn)?)
    })
    .await??;
    if removed == 0 {
        return Err(AppError::not_found("Notification not found"));
    }
    Ok(HttpResponse::Ok().json(MsgModel::new("Notification deleted")))
}

pub async fn delete_all(user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    web::block(move || -> Result<usize, AppError> {
        use schema::notifications::dsl::*;

        let mut conn = pool.get()?;
        Ok(diesel::delete(notifications.filter(user_id.eq(user.id))).execute(&mut conn)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(MsgModel::new("Notifications deleted")))
}
