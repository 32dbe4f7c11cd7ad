use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::{Rng, distributions::Alphanumeric};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Token;

const ARGON2_MEMORY: u32 = 64 * 1024; // 64KB
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const TOKEN_PREFIX: &str = "lectern";
const LOOKUP_LENGTH: usize = 8;
const SECRET_LENGTH: usize = 24;
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Issues and checks bearer tokens of the form `lectern_<lookup>_<secret>`.
///
/// Only the Argon2id hash of the whole token is stored; the lookup segment
/// finds the row without scanning.
pub struct TokenGenerator {
    argon2: Argon2<'static>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            ARGON2_MEMORY,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .unwrap_or_default();

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Returns (raw_token, lookup, hash)
    pub fn generate(&self) -> Result<(String, String, String)> {
        let lookup = random_segment(LOOKUP_LENGTH).to_ascii_lowercase();
        let secret = random_segment(SECRET_LENGTH);
        let raw_token = format!("{TOKEN_PREFIX}_{lookup}_{secret}");
        let hash = self.hash(&raw_token)?;
        Ok((raw_token, lookup, hash))
    }

    pub fn hash(&self, token: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(token.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash token: {e}")))?;
        Ok(hash.to_string())
    }

    pub fn verify(&self, token: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Config(format!("invalid hash format: {e}")))?;

        match self.argon2.verify_password(token.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify token: {e}"))),
        }
    }

    /// Creates and stores a token for `user_id` that expires after
    /// `ttl_minutes`. A lookup collision is retried with fresh randomness.
    pub fn issue(&self, store: &dyn Store, user_id: i64, ttl_minutes: i64) -> Result<(String, Token)> {
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let (raw_token, lookup, hash) = self.generate()?;
            let now = Utc::now();
            let token = Token {
                id: uuid::Uuid::new_v4().to_string(),
                token_hash: hash,
                token_lookup: lookup,
                user_id,
                created_at: now,
                expires_at: Some(now + Duration::minutes(ttl_minutes)),
                last_used_at: None,
            };

            match store.create_token(&token) {
                Ok(()) => return Ok((raw_token, token)),
                Err(Error::TokenLookupCollision) => {
                    tracing::debug!("Token lookup collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::TokenLookupCollision)
    }
}

fn random_segment(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Splits a raw token into (lookup, secret).
pub fn parse_token(token: &str) -> Result<(String, String)> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|s| s.strip_prefix('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    let (lookup, secret) = rest.split_once('_').ok_or(Error::InvalidTokenFormat)?;
    if lookup.len() != LOOKUP_LENGTH || secret.len() != SECRET_LENGTH || secret.contains('_') {
        return Err(Error::InvalidTokenFormat);
    }

    Ok((lookup.to_string(), secret.to_string()))
}
