use actix_web::{web, HttpResponse};
use chrono::Utc;
use diesel::{pg::Pg, prelude::*};

use crate::{
    auth::AuthUser,
    error::AppError,
    model::{
        contains_pattern,
        profile::{ProfileInfo, ProfileSearchModel, ProfileUpdateModel},
        page_offset, PAGE_SIZE,
    },
    schema::{self, NewProfile},
    store::pg::{load_avatar, load_avatars},
    DbPool,
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(upsert));
    cfg.route("/me", web::get().to(me));
    cfg.route("/user/{user_id}", web::get().to(by_user));
    cfg.route("/search", web::get().to(search));
    cfg.route("/picture/{image_id}", web::post().to(set_picture));
}

fn no_profile() -> AppError {
    AppError::BadRequest("There is no profile for this user".to_string())
}

fn profile_of(conn: &mut PgConnection, owner: i32) -> QueryResult<Option<schema::Profile>> {
    use schema::profiles::dsl::*;

    profiles
        .filter(user_id.eq(owner))
        .order(id.asc())
        .first::<schema::Profile>(conn)
        .optional()
}

fn with_picture(conn: &mut PgConnection, profile: schema::Profile) -> QueryResult<ProfileInfo> {
    let picture = load_avatar(conn, profile.picture)?;
    Ok(ProfileInfo::new(profile, picture))
}

async fn load_for(owner: i32, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let profile = web::block(move || -> Result<ProfileInfo, AppError> {
        let mut conn = pool.get()?;
        let profile = profile_of(&mut conn, owner)?.ok_or_else(no_profile)?;
        Ok(with_picture(&mut conn, profile)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn me(user: AuthUser, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    load_for(user.id, pool).await
}

pub async fn by_user(path: web::Path<i32>, pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    load_for(path.into_inner(), pool).await
}

/// Creates the caller's profile on first use, otherwise writes only the
/// supplied fields.
pub async fn upsert(
    web::Json(model): web::Json<ProfileUpdateModel>,
    user: AuthUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let mut changes = model.into_changes();
    let profile = web::block(move || -> Result<ProfileInfo, AppError> {
        use schema::{profiles, users};

        let mut conn = pool.get()?;
        let saved = match profile_of(&mut conn, user.id)? {
            Some(existing) => {
                changes.update_date = Some(Utc::now().naive_utc());
                diesel::update(profiles::table.find(existing.id))
                    .set(&changes)
                    .get_result::<schema::Profile>(&mut conn)?
            }
            None => conn.transaction(|conn| {
                let name = users::table
                    .find(user.id)
                    .select(users::username)
                    .first::<String>(conn)?;
                let created = diesel::insert_into(profiles::table)
                    .values(&NewProfile {
                        user_id: user.id,
                        username: &name,
                    })
                    .get_result::<schema::Profile>(conn)?;
                if changes.is_empty() {
                    return Ok::<_, diesel::result::Error>(created);
                }
                diesel::update(profiles::table.find(created.id))
                    .set(&changes)
                    .get_result::<schema::Profile>(conn)
            })?,
        };
        Ok(with_picture(&mut conn, saved)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn search(
    web::Query(criteria): web::Query<ProfileSearchModel>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    fn term(value: Option<String>) -> Option<String> {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| contains_pattern(&v))
    }

    let page = criteria.page.filter(|p| *p > 0).unwrap_or(1);
    let found = web::block(move || -> Result<Vec<ProfileInfo>, AppError> {
        use schema::profiles::dsl::*;

        let mut conn = pool.get()?;
        let mut query: schema::profiles::BoxedQuery<'_, Pg> = profiles.into_boxed();
        if let Some(pattern) = term(criteria.username) {
            query = query.filter(username.ilike(pattern));
        }
        if let Some(pattern) = term(criteria.name) {
            query = query.filter(name.ilike(pattern));
        }
        if let Some(pattern) = term(criteria.gender) {
            query = query.filter(gender.ilike(pattern));
        }
        if let Some(pattern) = term(criteria.about_me) {
            query = query.filter(about_me.ilike(pattern));
        }
        if let Some(pattern) = term(criteria.favorites) {
            query = query.filter(
                favorite_books
                    .ilike(pattern.clone())
                    .or(favorite_movies.ilike(pattern.clone()))
                    .or(favorite_music.ilike(pattern)),
            );
        }

        let matches = query
            .order(id.asc())
            .offset(page_offset(page, PAGE_SIZE))
            .limit(PAGE_SIZE)
            .load::<schema::Profile>(&mut conn)?;
        let picture_ids = matches.iter().filter_map(|p| p.picture).collect::<Vec<_>>();
        let pictures = load_avatars(&mut conn, &picture_ids)?;
        Ok(matches
            .into_iter()
            .map(|p| {
                let shown = p.picture.and_then(|i| pictures.get(&i).cloned());
                ProfileInfo::new(p, shown)
            })
            .collect())
    })
    .await??;
    Ok(HttpResponse::Ok().json(found))
}

/// Points both the profile picture and the user avatar at one of the
/// caller's images.
pub async fn set_picture(
    path: web::Path<i32>,
    user: AuthUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let image_id = path.into_inner();
    let profile = web::block(move || -> Result<ProfileInfo, AppError> {
        use schema::{images, profiles, users};

        let mut conn = pool.get()?;
        let owner = images::table
            .find(image_id)
            .select(images::user_id)
            .first::<i32>(&mut conn)
            .optional()?;
        if owner != Some(user.id) {
            return Err(AppError::not_found("Image not found"));
        }

        let updated = conn.transaction(|conn| -> Result<schema::Profile, AppError> {
            let profile = profile_of(conn, user.id)?.ok_or_else(no_profile)?;
            let profile = diesel::update(profiles::table.find(profile.id))
                .set((
                    profiles::picture.eq(Some(image_id)),
                    profiles::update_date.eq(Some(Utc::now().naive_utc())),
                ))
                .get_result::<schema::Profile>(conn)?;
            diesel::update(users::table.find(user.id))
                .set(users::avatar.eq(Some(image_id)))
                .execute(conn)?;
            Ok(profile)
        })?;
        Ok(with_picture(&mut conn, updated)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(profile))
}
