use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::AppError,
    model::{
        image::{ImageInfo, NewImageModel},
        MsgModel,
    },
    schema::{self, Image, NewImage},
    DbPool,
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create));
    cfg.route("", web::get().to(mine));
    cfg.route("/{id}", web::get().to(get));
    cfg.route("/{id}", web::delete().to(delete));
}

fn image_not_found() -> AppError {
    AppError::not_found("Image not found")
}

/// Records an already-hosted image; the urls are stored as given.
pub async fn create(
    web::Json(model): web::Json<NewImageModel>,
    user: AuthUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    model.validate()?;
    let image = web::block(move || -> Result<Image, AppError> {
        use schema::images::dsl::*;

        let mut conn = pool.get()?;
        Ok(diesel::insert_into(images)
            .values(&NewImage {
                user_id: user.id,
                url_full: &model.url_full,
                url_175: model.url_175.as_deref(),
                url_80: model.url_80.as_deref(),
                filetype: model.filetype.as_deref(),
                height: model.height.as_deref(),
                width: model.width.as_deref(),
                filesize: model.filesize.as_deref(),
            })
            .get_result::<Image>(&mut conn)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(ImageInfo::from(image)))
}

pub async fn mine(user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let list = web::block(move || -> Result<Vec<Image>, AppError> {
        use schema::images::dsl::*;

        let mut conn = pool.get()?;
        Ok(images
            .filter(user_id.eq(user.id))
            .order((create_date.desc(), id.desc()))
            .load::<Image>(&mut conn)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(list.into_iter().map(ImageInfo::from).collect::<Vec<_>>()))
}

pub async fn get(path: web::Path<i32>, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let image_id = path.into_inner();
    let image = web::block(move || -> Result<Option<Image>, AppError> {
        use schema::images::dsl::*;

        let mut conn = pool.get()?;
        Ok(images.find(image_id).first::<Image>(&mut conn).optional()?)
    })
    .await??
    .ok_or_else(image_not_found)?;
    Ok(HttpResponse::Ok().json(ImageInfo::from(image)))
}

/// Profiles and users pointing at the image lose their picture.
pub async fn delete(path: web::Path<i32>, user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let image_id = path.into_inner();
    let removed = web::block(move || -> Result<usize, AppError> {
        use schema::images::dsl::*;

        let mut conn = pool.get()?;
        Ok(diesel::delete(images.filter(id.eq(image_id).and(user_id.eq(user.id))))
            .execute(&mut conn)?)
    })
    .await??;
    if removed == 0 {
        return Err(image_not_found());
    }
    Ok(HttpResponse::Ok().json(MsgModel::new("Image deleted")))
}
