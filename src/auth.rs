//! Request authorization.
//!
//! Every gated handler takes one of [`AuthUser`], [`ModeratorUser`] or
//! [`AdminUser`]. All three run [`authorize`]: the token from the
//! `x-auth-token` header must verify, its user must still exist, and that
//! user's role must satisfy the extractor's requirement.

use std::marker::PhantomData;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use serde::Serialize;
use tracing::debug;

use crate::{error::AppError, state::AppState, token::TOKEN_HEADER};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Unrecognised values get no privileges.
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            _ => Role::Regular,
        }
    }
}

pub trait RoleRequirement {
    fn permits(role: Role) -> bool;
}

pub struct AnyRole;

pub struct ModeratorRole;

pub struct AdminRole;

impl RoleRequirement for AnyRole {
    fn permits(_: Role) -> bool {
        true
    }
}

impl RoleRequirement for ModeratorRole {
    fn permits(role: Role) -> bool {
        matches!(role, Role::Moderator | Role::Admin)
    }
}

impl RoleRequirement for AdminRole {
    fn permits(role: Role) -> bool {
        role == Role::Admin
    }
}

/// The caller's identity, present only once `R` has been satisfied.
#[derive(Debug)]
pub struct Authorized<R> {
    pub id: i32,
    _requirement: PhantomData<fn() -> R>,
}

pub type AuthUser = Authorized<AnyRole>;
pub type ModeratorUser = Authorized<ModeratorRole>;
pub type AdminUser = Authorized<AdminRole>;

/// Resolves a raw header value to the id of a user whose role passes `permits`.
///
/// Performs one user lookup per call.
pub fn authorize(
    state: &AppState,
    token: Option<&str>,
    permits: fn(Role) -> bool,
) -> Result<i32, AppError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthenticated)?;
    let user = state.tokens.verify(token).map_err(|e| {
        debug!(error = %e, "rejected session token");
        AppError::InvalidToken
    })?;
    let role = state
        .users
        .find_role(user.id)?
        .ok_or(AppError::InvalidToken)?;
    if !permits(role) {
        return Err(AppError::not_authorized());
    }
    Ok(user.id)
}

impl<R: RoleRequirement + 'static> FromRequest for Authorized<R> {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = req
            .headers()
            .get(TOKEN_HEADER)
            .map(|value| value.to_str().map(str::to_owned));

        Box::pin(async move {
            let state =
                state.ok_or_else(|| AppError::Internal("application state missing".into()))?;
            let token = match token {
                None => None,
                Some(Ok(token)) => Some(token),
                Some(Err(_)) => return Err(AppError::InvalidToken),
            };
            let id = web::block(move || authorize(&state, token.as_deref(), R::permits)).await??;
            Ok(Authorized {
                id,
                _requirement: PhantomData,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{
        http::StatusCode,
        test::{call_service, init_service, read_body, TestRequest},
        App, HttpResponse,
    };

    use super::*;
    use crate::{identity::tests::NoIdentity, store::memory::MemoryStore, token::TokenService};

    const REGULAR: i32 = 1;
    const MODERATOR: i32 = 2;
    const ADMIN: i32 = 3;

    fn state() -> web::Data<AppState> {
        let store = Arc::new(MemoryStore::default());
        store.add_user(REGULAR, "regular", Role::Regular);
        store.add_user(MODERATOR, "moderator", Role::Moderator);
        store.add_user(ADMIN, "admin", Role::Admin);
        web::Data::new(AppState {
            tokens: TokenService::new(b"test-secret", 3600),
            users: store.clone(),
            friendships: store,
            identity: Arc::new(NoIdentity),
        })
    }

    async fn any(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(user.id.to_string())
    }

    async fn moderator(user: ModeratorUser) -> HttpResponse {
        HttpResponse::Ok().body(user.id.to_string())
    }

    async fn admin(user: AdminUser) -> HttpResponse {
        HttpResponse::Ok().body(user.id.to_string())
    }

    async fn call(path: &str, token: Option<String>) -> (StatusCode, String) {
        let app = init_service(
            App::new()
                .app_data(state())
                .route("/any", web::get().to(any))
                .route("/moderator", web::get().to(moderator))
                .route("/admin", web::get().to(admin)),
        )
        .await;
        let mut req = TestRequest::get().uri(path);
        if let Some(token) = token {
            req = req.insert_header((TOKEN_HEADER, token));
        }
        let resp = call_service(&app, req.to_request()).await;
        let status = resp.status();
        let body = read_body(resp).await;
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    fn token_for(user: i32) -> Option<String> {
        Some(TokenService::new(b"test-secret", 3600).issue(user).unwrap())
    }

    #[actix_web::test]
    async fn missing_token_is_unauthenticated() {
        let (status, body) = call("/any", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("No token, authorization denied"));

        let (status, _) = call("/any", Some(String::new())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn forged_token_is_invalid() {
        let forged = TokenService::new(b"other-secret", 3600).issue(REGULAR).unwrap();
        let (status, body) = call("/any", Some(forged)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Token is not valid"));
    }

    #[actix_web::test]
    async fn token_for_deleted_user_is_invalid() {
        let (status, body) = call("/any", token_for(404)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Token is not valid"));
    }

    #[actix_web::test]
    async fn any_role_passes_plain_auth() {
        let (status, body) = call("/any", token_for(REGULAR)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1");
    }

    #[actix_web::test]
    async fn moderator_gate_admits_moderators_and_admins() {
        let (status, body) = call("/moderator", token_for(REGULAR)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Not authorized"));

        assert_eq!(call("/moderator", token_for(MODERATOR)).await.0, StatusCode::OK);
        assert_eq!(call("/moderator", token_for(ADMIN)).await.0, StatusCode::OK);
    }

    #[actix_web::test]
    async fn admin_gate_admits_only_admins() {
        assert_eq!(call("/admin", token_for(REGULAR)).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call("/admin", token_for(MODERATOR)).await.0, StatusCode::UNAUTHORIZED);
        let (status, body) = call("/admin", token_for(ADMIN)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "3");
    }

    #[test]
    fn unknown_role_has_no_privileges() {
        assert_eq!(Role::parse("superuser"), Role::Regular);
        assert!(!ModeratorRole::permits(Role::parse("superuser")));
        assert_eq!(Role::parse(Role::Moderator.as_str()), Role::Moderator);
    }
}
