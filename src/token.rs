use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Request header carrying the session token.
pub const TOKEN_HEADER: &str = "x-auth-token";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenUser {
    pub id: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub user: TokenUser,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], expires_in: i64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expires_in,
        }
    }

    pub fn issue(&self, user_id: i32) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user: TokenUser { id: user_id },
            iat: now,
            exp: now + self.expires_in,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Fails on a bad signature, a malformed token or an elapsed expiry.
    pub fn verify(&self, token: &str) -> Result<TokenUser, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims.user)
    }
}
