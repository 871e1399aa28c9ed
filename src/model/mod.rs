pub mod friendship;
pub mod image;
pub mod live;
pub mod message;
pub mod notification;
pub mod post;
pub mod profile;
pub mod user;

use serde::{Deserialize, Serialize};

/// Plain `{ "msg": ... }` body used for acknowledgements and most errors.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct MsgModel {
    pub msg: String,
}

impl MsgModel {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Field-level error listing, `{ "errors": [{ "msg": ... }] }`.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorsModel {
    pub errors: Vec<MsgModel>,
}

#[derive(Serialize, Debug)]
pub struct TokenModel {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageModel {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub const PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

impl PageModel {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l > 0)
            .map_or(PAGE_SIZE, |l| l.min(MAX_PAGE_SIZE))
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page(), self.limit())
    }
}

/// Rows to skip before 1-based `page`; saturates instead of overflowing.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.max(1).saturating_sub(1).saturating_mul(limit)
}

/// Wraps `term` for an `ILIKE` substring match, escaping the pattern metacharacters.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Escapes `term` so `ILIKE` compares it literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
