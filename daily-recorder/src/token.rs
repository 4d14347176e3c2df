//! Self-signed meeting tokens.
//!
//! A meeting token is an HS256 JWT signed with the API key. The provider
//! accepts it in place of a token minted through `POST /meeting-tokens`.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Options for minting a meeting token.
#[derive(Debug, Clone)]
pub struct TokenOptions {
    pub room_name: String,
    pub is_owner: bool,
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub ttl_secs: i64,
    /// Recording mode the token holder may start, e.g. `cloud`
    pub enable_recording: Option<String>,
}

impl TokenOptions {
    pub fn for_room(room_name: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            is_owner: false,
            user_name: None,
            user_id: None,
            ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            enable_recording: None,
        }
    }
}

/// Claims in the provider's abbreviated form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeetingClaims {
    pub r: String,
    pub d: String,
    pub o: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub u: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub er: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Mint a signed meeting token.
pub fn mint_meeting_token(
    api_key: &str,
    domain_id: Option<&str>,
    options: &TokenOptions,
) -> Result<String, ApiError> {
    let domain_id = domain_id
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::Token("DAILY_DOMAIN_ID is required for self-signed tokens".to_string()))?;

    if options.room_name.is_empty() {
        return Err(ApiError::Token("room name is required".to_string()));
    }

    let iat = Utc::now().timestamp();
    let claims = MeetingClaims {
        r: options.room_name.clone(),
        d: domain_id.to_string(),
        o: options.is_owner,
        u: options.user_name.clone(),
        ud: options.user_id.clone(),
        er: options.enable_recording.clone(),
        iat,
        exp: iat + options.ttl_secs.max(1),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(api_key.as_bytes()),
    )
    .map_err(|e| ApiError::Token(e.to_string()))
}
