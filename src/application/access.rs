//! Bearer access tokens for the HTTP boundary.
//!
//! Tokens are configured as lowercase hex SHA-256 digests; the raw token is
//! never stored. Lookup hashes the presented token and compares it against
//! every configured digest in constant time.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Manager,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Manager => "manager",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("missing access token")]
    Missing,
    #[error("invalid access token")]
    Invalid,
    #[error("role `{0}` required")]
    Forbidden(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn requires(&self, role: Role) -> Result<(), AccessError> {
        if self.role == role || self.role == Role::Manager {
            Ok(())
        } else {
            Err(AccessError::Forbidden(role.as_str()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub digest: Vec<u8>,
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct AccessService {
    tokens: Vec<AccessToken>,
}

impl AccessService {
    pub fn new(tokens: Vec<AccessToken>) -> Self {
        Self { tokens }
    }

    pub fn authenticate(&self, token: Option<&str>) -> Result<Principal, AccessError> {
        let token = token
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AccessError::Missing)?;
        let presented = hash_token(token);

        // Every entry is compared; no early exit.
        let mut matched = None;
        for entry in &self.tokens {
            if bool::from(entry.digest.ct_eq(&presented)) {
                matched = Some(Principal {
                    user_id: entry.user_id,
                    role: entry.role,
                });
            }
        }
        matched.ok_or(AccessError::Invalid)
    }
}

pub fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Decode a configured hex digest; `None` unless it is exactly 32 bytes.
pub fn decode_digest(hex_digest: &str) -> Option<Vec<u8>> {
    let bytes = hex::decode(hex_digest.trim()).ok()?;
    (bytes.len() == 32).then_some(bytes)
}
