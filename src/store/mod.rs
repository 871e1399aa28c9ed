#[cfg(test)]
pub mod memory;
pub mod pg;

use std::collections::HashMap;

use thiserror::Error;

use crate::{
    auth::Role,
    friendship::{Friendship, FriendshipStatus},
    model::user::UserSummary,
};

pub use pg::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("query: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// User lookups needed by request authorization and by views that embed users.
pub trait UserStore: Send + Sync {
    fn find_role(&self, user_id: i32) -> Result<Option<Role>, StoreError>;

    /// Users missing from the store are absent from the map.
    fn summaries(&self, user_ids: &[i32]) -> Result<HashMap<i32, UserSummary>, StoreError>;
}

/// Directed friendship records. Callers interpret orientation.
pub trait FriendshipStore: Send + Sync {
    fn insert(
        &self,
        initiator: i32,
        recipient: i32,
        status: FriendshipStatus,
    ) -> Result<Friendship, StoreError>;

    /// The oldest record stored exactly as `user1 -> user2`.
    fn find_directed(&self, user1: i32, user2: i32) -> Result<Option<Friendship>, StoreError>;

    /// Moves record `id` from `from` to `to` only when `recipient` is its `user2`.
    fn transition(
        &self,
        id: i32,
        recipient: i32,
        from: FriendshipStatus,
        to: FriendshipStatus,
    ) -> Result<Option<Friendship>, StoreError>;

    fn delete(&self, id: i32) -> Result<bool, StoreError>;

    /// Requested records addressed to `recipient`, newest first.
    fn incoming(&self, recipient: i32) -> Result<Vec<Friendship>, StoreError>;

    fn count_incoming(&self, recipient: i32) -> Result<i64, StoreError>;

    /// Accepted records with `user` on either side, oldest first.
    fn accepted_for(&self, user: i32) -> Result<Vec<Friendship>, StoreError>;
}
