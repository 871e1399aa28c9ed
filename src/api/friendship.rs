use actix::Addr;
use actix_web::{web, HttpResponse};

use super::stream::{publish, LiveServer};
use crate::{
    auth::AuthUser,
    error::AppError,
    friendship,
    model::live::LiveEventKind,
    state::AppState,
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/request/{friend_id}", web::post().to(request));
    cfg.route("/requests", web::get().to(requests));
    cfg.route("/num_requests/{user_id}", web::get().to(num_requests));
    cfg.route("/status/{user1}/{user2}", web::get().to(status));
    cfg.route("/friends", web::get().to(friends));
    cfg.route("/friends/{user_id}", web::get().to(friends_of));
    cfg.route("/request/{request_id}/accept", web::post().to(accept));
    cfg.route("/request/{request_id}/reject", web::post().to(reject));
    cfg.route("/remove/{user_id}", web::delete().to(remove));
}

pub async fn request(
    path: web::Path<i32>,
    user: AuthUser,
    state: web::Data<AppState>,
    live: web::Data<Addr<LiveServer>>,
) -> Result<HttpResponse, AppError> {
    let friend_id = path.into_inner();
    let record = web::block(move || {
        friendship::create_request(
            state.friendships.as_ref(),
            state.users.as_ref(),
            user.id,
            friend_id,
        )
    })
    .await??;
    publish(&live, record.user2, LiveEventKind::FriendRequest, &record);
    Ok(HttpResponse::Ok().json(record))
}

pub async fn requests(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let list = web::block(move || {
        friendship::incoming_requests(state.friendships.as_ref(), state.users.as_ref(), user.id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn num_requests(
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let count =
        web::block(move || friendship::count_incoming(state.friendships.as_ref(), user_id))
            .await??;
    Ok(HttpResponse::Ok().json(count))
}

pub async fn status(
    path: web::Path<(i32, i32)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (user1, user2) = path.into_inner();
    let status =
        web::block(move || friendship::status(state.friendships.as_ref(), user1, user2)).await??;
    Ok(HttpResponse::Ok().json(status))
}

pub async fn friends(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    list_friends(user.id, state).await
}

pub async fn friends_of(
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    list_friends(path.into_inner(), state).await
}

async fn list_friends(user_id: i32, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let list = web::block(move || {
        friendship::friends(state.friendships.as_ref(), state.users.as_ref(), user_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn accept(
    path: web::Path<i32>,
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    let record =
        web::block(move || friendship::accept(state.friendships.as_ref(), user.id, request_id))
            .await??;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn reject(
    path: web::Path<i32>,
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    let record =
        web::block(move || friendship::reject(state.friendships.as_ref(), user.id, request_id))
            .await??;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn remove(
    path: web::Path<i32>,
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let other = path.into_inner();
    let removed =
        web::block(move || friendship::remove(state.friendships.as_ref(), user.id, other))
            .await??;
    Ok(HttpResponse::Ok().json(if removed {
        "friendship removed"
    } else {
        "no friendship"
    }))
}
