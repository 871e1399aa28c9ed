use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use tracing::debug;
use validator::Validate;

use crate::{
    error::AppError,
    model::{user::LoginModel, TokenModel},
    schema,
    state::AppState,
    DbPool,
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(login));
}

fn invalid_credentials() -> AppError {
    AppError::Validation(vec!["Invalid Credentials".to_string()])
}

pub async fn login(
    web::Json(model): web::Json<LoginModel>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    model.validate()?;
    let gateway = state.clone();
    let user_id = web::block(move || -> Result<i32, AppError> {
        use schema::users::dsl::*;

        let mut conn = pool.get()?;
        let found = users
            .filter(email.eq(&model.email))
            .select(id)
            .first::<i32>(&mut conn)
            .optional()?
            .ok_or_else(invalid_credentials)?;
        gateway.identity.sign_in(&model.email, &model.password)?;
        Ok(found)
    })
    .await??;

    debug!(user_id, "signed in");
    let token = state.tokens.issue(user_id)?;
    Ok(HttpResponse::Ok().json(TokenModel { token }))
}
