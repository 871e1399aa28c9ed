pub mod auth;
pub mod friendship;
pub mod image;
pub mod message;
pub mod notification;
pub mod post;
pub mod profile;
pub mod stream;
pub mod user;

use actix_cors::Cors;
use actix_web::{http::header, web};

use crate::token::TOKEN_HEADER;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(web::scope("/users").configure(user::config))
            .service(web::scope("/auth").configure(auth::config))
            .service(web::scope("/profile").configure(profile::config))
            .service(web::scope("/posts").configure(post::config))
            .service(web::scope("/message").configure(message::config))
            .service(web::scope("/notification").configure(notification::config))
            .service(web::scope("/image").configure(image::config))
            .service(web::scope("/friendship").configure(friendship::config))
            .route("/stream", web::get().to(stream::stream)),
    );
}

/// Any origin when `origins` is empty, otherwise only the listed ones.
pub fn cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allowed_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allowed_header(TOKEN_HEADER)
        .max_age(3600);
    if origins.is_empty() {
        return cors.allow_any_origin().send_wildcard();
    }
    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::{header, StatusCode},
        test::{call_service, init_service, TestRequest},
        App, HttpResponse,
    };

    use super::*;

    async fn preflight(origins: &[String], origin: &str) -> (StatusCode, Option<String>) {
        let app = init_service(
            App::new()
                .wrap(cors(origins))
                .route("/api/posts", web::post().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let req = TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/posts")
            .insert_header((header::ORIGIN, origin))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, TOKEN_HEADER))
            .to_request();
        let resp = call_service(&app, req).await;
        let allowed = resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (resp.status(), allowed)
    }

    #[actix_web::test]
    async fn any_origin_by_default() {
        let (status, allowed) = preflight(&[], "https://client.example").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(allowed.as_deref(), Some("*"));
    }

    #[actix_web::test]
    async fn listed_origin_is_echoed() {
        let origins = vec!["https://client.example".to_string()];
        let (status, allowed) = preflight(&origins, "https://client.example").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(allowed.as_deref(), Some("https://client.example"));
    }

    #[actix_web::test]
    async fn unlisted_origin_gets_no_grant() {
        let origins = vec!["https://client.example".to_string()];
        let (_, allowed) = preflight(&origins, "https://elsewhere.example").await;
        assert_eq!(allowed, None);
    }
}
