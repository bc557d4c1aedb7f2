// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT compatibility tests.
//!
//! These tests decode tokens from `TokenService` with plain `jsonwebtoken`,
//! so a change to the claims layout or algorithm shows up here before it
//! breaks clients that inspect the token.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use khelo_api::config::Config;
use khelo_api::models::Role;
use khelo_api::services::{TokenError, TokenService};
use serde::Deserialize;

/// Claims structure that clients are allowed to rely on.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    exp: i64,
    iat: i64,
}

#[test]
fn test_jwt_claims_layout() {
    let config = Config::test_default();
    let tokens = TokenService::from_config(&config);
    let token = tokens.issue("user-123", Role::Coach).unwrap();

    let key = DecodingKey::from_secret(&config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(&token, &key, &validation)
        .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, "user-123");
    assert_eq!(token_data.claims.role, "coach");
    assert_eq!(
        token_data.claims.exp - token_data.claims.iat,
        config.token_ttl_secs
    );
}

#[test]
fn test_jwt_expiration_matches_config() {
    let mut config = Config::test_default();
    config.token_ttl_secs = 7 * 24 * 60 * 60;
    let tokens = TokenService::from_config(&config);
    let token = tokens.issue("user-123", Role::Athlete).unwrap();

    let key = DecodingKey::from_secret(&config.jwt_signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false; // We'll check manually

    let token_data = decode::<Claims>(&token, &key, &validation).unwrap();
    let now = chrono::Utc::now().timestamp();

    // Token should expire at least 6 days in the future
    assert!(
        token_data.claims.exp > now + 86400 * 6,
        "Token expiration should be ~7 days in the future"
    );
}

#[test]
fn test_token_without_subject_rejected() {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct NoSubject {
        role: &'static str,
        exp: i64,
        iat: i64,
    }

    let config = Config::test_default();
    let now = chrono::Utc::now().timestamp();
    let token = encode(
        &Header::new(Algorithm::HS256),
        &NoSubject {
            role: "athlete",
            exp: now + 3600,
            iat: now,
        },
        &EncodingKey::from_secret(&config.jwt_signing_key),
    )
    .unwrap();

    let tokens = TokenService::from_config(&config);
    assert_eq!(tokens.verify(&token), Err(TokenError::Malformed));
}

#[test]
fn test_none_algorithm_rejected() {
    let config = Config::test_default();
    let tokens = TokenService::from_config(&config);

    // {"alg":"none","typ":"JWT"} . {"sub":"u1","role":"admin","iat":0,"exp":9999999999} .
    let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                 eyJzdWIiOiJ1MSIsInJvbGUiOiJhZG1pbiIsImlhdCI6MCwiZXhwIjo5OTk5OTk5OTk5fQ.";
    assert!(tokens.verify(token).is_err());
}
