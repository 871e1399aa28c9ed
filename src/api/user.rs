use actix_web::{http::header, web, HttpResponse};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    auth::{AdminUser, AuthUser, Role},
    error::AppError,
    model::{
        escape_like,
        user::{ForgotPasswordModel, RegisterModel, UserInfo},
        MsgModel, TokenModel,
    },
    schema::{self, NewProfile, NewUser},
    state::AppState,
    store::pg::load_avatars,
    DbPool,
};

/// How recently a heartbeat must have arrived for a user to count as online.
const ONLINE_WINDOW_MINUTES: i64 = 15;
const RECENT_USERS: i64 = 4;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(register));
    cfg.route("", web::delete().to(delete_self));
    cfg.route("/recent", web::get().to(recent));
    cfg.route("/online", web::get().to(online));
    cfg.route("/last_online", web::get().to(last_online));
    cfg.route("/forgot-password", web::post().to(forgot_password));
    cfg.route("/{username}", web::delete().to(delete_by_username));
}

pub(crate) fn find_by_username(
    conn: &mut PgConnection,
    name: &str,
) -> QueryResult<Option<schema::User>> {
    use schema::users::dsl::*;

    users
        .filter(username.ilike(escape_like(name)))
        .first::<schema::User>(conn)
        .optional()
}

fn with_avatars(conn: &mut PgConnection, list: Vec<schema::User>) -> QueryResult<Vec<UserInfo>> {
    let ids = list.iter().filter_map(|u| u.avatar).collect::<Vec<_>>();
    let avatars = load_avatars(conn, &ids)?;
    Ok(list
        .into_iter()
        .map(|u| {
            let avatar = u.avatar.and_then(|a| avatars.get(&a).cloned());
            UserInfo::new(u, avatar)
        })
        .collect())
}

/// Removes the user row and its profile, returning the identity uid if the
/// user existed.
fn remove_user(conn: &mut PgConnection, user_id: i32) -> QueryResult<Option<String>> {
    use schema::{profiles, users};

    conn.transaction(|conn| {
        diesel::delete(profiles::table.filter(profiles::user_id.eq(user_id))).execute(conn)?;
        diesel::delete(users::table.find(user_id))
            .returning(users::uid)
            .get_result::<String>(conn)
            .optional()
    })
}

fn release_identity(state: &AppState, uid: &str) {
    if let Err(e) = state.identity.delete_account(uid) {
        warn!(error = %e, uid, "failed to delete identity account");
    }
}

pub async fn register(
    web::Json(model): web::Json<RegisterModel>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    model.validate()?;
    let gateway = state.clone();
    let user = web::block(move || -> Result<schema::User, AppError> {
        use schema::{profiles, users};

        let mut conn = pool.get()?;
        let registered = users::table
            .filter(users::email.eq(&model.email))
            .select(users::id)
            .first::<i32>(&mut conn)
            .optional()?;
        if registered.is_some() {
            return Err(AppError::conflict("Email address already registered"));
        }
        if find_by_username(&mut conn, &model.username)?.is_some() {
            return Err(AppError::conflict("That username is already taken"));
        }

        let uid = gateway
            .identity
            .create_account(&model.email, &model.password)
            .map_err(|e| {
                warn!(error = %e, "identity account creation failed");
                AppError::Upstream("Problem creating account. Please try again.".to_string())
            })?;

        let created = conn.transaction(|conn| {
            let user = diesel::insert_into(users::table)
                .values(&NewUser {
                    username: &model.username,
                    email: &model.email,
                    role: Role::Regular.as_str(),
                    uid: &uid,
                })
                .get_result::<schema::User>(conn)?;
            diesel::insert_into(profiles::table)
                .values(&NewProfile {
                    user_id: user.id,
                    username: &user.username,
                })
                .execute(conn)?;
            Ok::<_, diesel::result::Error>(user)
        });
        created.map_err(|e| {
            release_identity(&gateway, &uid);
            AppError::from(e)
        })
    })
    .await??;

    info!(user_id = user.id, username = %user.username, "registered user");
    let token = state.tokens.issue(user.id)?;
    Ok(HttpResponse::Ok().json(TokenModel { token }))
}

pub async fn delete_self(
    user: AuthUser,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    web::block(move || -> Result<(), AppError> {
        let mut conn = pool.get()?;
        if let Some(uid) = remove_user(&mut conn, user.id)? {
            release_identity(&state, &uid);
        }
        Ok(())
    })
    .await??;
    Ok(HttpResponse::Ok().json(MsgModel::new("User deleted")))
}

pub async fn delete_by_username(
    path: web::Path<String>,
    admin: AdminUser,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    let removed = web::block(move || -> Result<i32, AppError> {
        let mut conn = pool.get()?;
        let target = find_by_username(&mut conn, &name)?
            .ok_or_else(|| AppError::Validation(vec!["User does not exist".to_string()]))?;
        if let Some(uid) = remove_user(&mut conn, target.id)? {
            release_identity(&state, &uid);
        }
        Ok(target.id)
    })
    .await??;
    info!(admin = admin.id, user_id = removed, "admin removed user");
    Ok(HttpResponse::Ok().json(MsgModel::new("User deleted")))
}

pub async fn recent(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let list = web::block(move || -> Result<Vec<UserInfo>, AppError> {
        use schema::users::dsl::*;

        let mut conn = pool.get()?;
        let newest = users
            .order((create_date.desc(), id.desc()))
            .limit(RECENT_USERS)
            .load::<schema::User>(&mut conn)?;
        Ok(with_avatars(&mut conn, newest)?)
    })
    .await??;
    Ok(HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "public, max-age=60, s-maxage=60"))
        .json(list))
}

pub async fn online(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let since = Utc::now().naive_utc() - Duration::minutes(ONLINE_WINDOW_MINUTES);
    let list = web::block(move || -> Result<Vec<UserInfo>, AppError> {
        use schema::users::dsl::*;

        let mut conn = pool.get()?;
        let active = users
            .filter(last_online.gt(since))
            .order(last_online.desc())
            .load::<schema::User>(&mut conn)?;
        Ok(with_avatars(&mut conn, active)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn last_online(user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    web::block(move || -> Result<(), AppError> {
        use schema::users::dsl::*;

        let mut conn = pool.get()?;
        diesel::update(users.find(user.id))
            .set(last_online.eq(Utc::now().naive_utc()))
            .execute(&mut conn)?;
        Ok(())
    })
    .await??;
    Ok(HttpResponse::Ok().finish())
}

pub async fn forgot_password(
    web::Json(model): web::Json<ForgotPasswordModel>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let email = model
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Validation(vec!["Email required".to_string()]))?;

    // Unknown addresses get the same answer as known ones.
    web::block(move || {
        if let Err(e) = state.identity.send_password_reset(&email) {
            warn!(error = %e, "password reset request failed");
        }
    })
    .await?;
    Ok(HttpResponse::Ok().json(MsgModel::new("Email sent")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use diesel::r2d2::{ConnectionManager, Pool};
    use serde_json::{json, Value};

    use super::*;
    use crate::{identity::tests::NoIdentity, store::memory::MemoryStore, token::TokenService};

    fn app_state() -> web::Data<AppState> {
        let store = Arc::new(MemoryStore::default());
        web::Data::new(AppState {
            tokens: TokenService::new(b"users", 3600),
            users: store.clone(),
            friendships: store,
            identity: Arc::new(NoIdentity),
        })
    }

    #[actix_web::test]
    async fn forgot_password_requires_an_email() {
        let app = test::init_service(
            App::new()
                .app_data(app_state())
                .route("/forgot-password", web::post().to(forgot_password)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/forgot-password")
                .set_json(json!({ "email": "  " }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "errors": [{ "msg": "Email required" }] }));
    }

    #[actix_web::test]
    async fn forgot_password_always_reports_sent() {
        let app = test::init_service(
            App::new()
                .app_data(app_state())
                .route("/forgot-password", web::post().to(forgot_password)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/forgot-password")
                .set_json(json!({ "email": "nobody@example.com" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "msg": "Email sent" }));
    }

    #[actix_web::test]
    async fn registration_lists_every_violation() {
        let pool: DbPool = Pool::builder()
            .min_idle(Some(0))
            .build_unchecked(ConnectionManager::new("postgres://localhost/unreachable"));
        let app = test::init_service(
            App::new()
                .app_data(app_state())
                .app_data(web::Data::new(pool))
                .service(web::scope("/api/users").configure(config)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/users")
                .set_json(json!({ "username": "", "email": "alice", "password": "123" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({ "errors": [
                { "msg": "Please include a valid email" },
                { "msg": "Please enter a password with 6 or more characters" },
                { "msg": "Username is required" },
            ] })
        );
    }
}
