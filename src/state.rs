use std::sync::Arc;

use crate::{
    identity::IdentityGateway,
    store::{FriendshipStore, UserStore},
    token::TokenService,
};

pub struct AppState {
    pub tokens: TokenService,
    pub users: Arc<dyn UserStore>,
    pub friendships: Arc<dyn FriendshipStore>,
    pub identity: Arc<dyn IdentityGateway>,
}
