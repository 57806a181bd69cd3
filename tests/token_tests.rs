use chrono::Duration;
use uuid::Uuid;

use qcontrol::auth::jwt::{Claims, Lifetime, SessionKind, decode_token, encode_token};

const SECRET: &str = "test-jwt-secret-that-is-long-enough";

#[test]
fn issued_token_verifies_with_same_secret() {
    let id = Uuid::now_v7();
    let claims = Claims::session(id, "qa@test.com", "worker", Lifetime::Standard);
    let token = encode_token(&claims, SECRET).unwrap();

    let decoded = decode_token(&token, SECRET).unwrap();
    assert_eq!(decoded.sub, id);
    assert_eq!(decoded.email, "qa@test.com");
    assert_eq!(decoded.role, "worker");
    assert_eq!(decoded.kind, SessionKind::Full);
    assert_eq!(decoded.exp - decoded.iat, 24 * 3600);
}

#[test]
fn extended_and_challenge_lifetimes() {
    let id = Uuid::now_v7();

    let extended = Claims::session(id, "qa@test.com", "admin", Lifetime::Extended);
    assert_eq!(extended.exp - extended.iat, 7 * 24 * 3600);

    let challenge = Claims::challenge(id, "qa@test.com", "admin");
    assert_eq!(challenge.kind, SessionKind::MfaChallenge);
    assert_eq!(challenge.exp - challenge.iat, 5 * 60);

    let token = encode_token(&challenge, SECRET).unwrap();
    assert_eq!(
        decode_token(&token, SECRET).unwrap().kind,
        SessionKind::MfaChallenge
    );
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let claims = Claims::session(Uuid::now_v7(), "qa@test.com", "worker", Lifetime::Standard);
    let token = encode_token(&claims, "some-other-secret").unwrap();

    assert!(decode_token(&token, SECRET).is_err());
}

#[test]
fn expired_token_is_rejected() {
    let claims = Claims::new(
        Uuid::now_v7(),
        "qa@test.com",
        "worker",
        SessionKind::Full,
        Duration::minutes(-5),
    );
    let token = encode_token(&claims, SECRET).unwrap();

    assert!(decode_token(&token, SECRET).is_err());
}

#[test]
fn token_is_rejected_seconds_after_expiry() {
    let session = Claims::new(
        Uuid::now_v7(),
        "qa@test.com",
        "worker",
        SessionKind::Full,
        Duration::seconds(-30),
    );
    let token = encode_token(&session, SECRET).unwrap();
    assert!(decode_token(&token, SECRET).is_err());

    let challenge = Claims::new(
        Uuid::now_v7(),
        "qa@test.com",
        "worker",
        SessionKind::MfaChallenge,
        Duration::seconds(-45),
    );
    let token = encode_token(&challenge, SECRET).unwrap();
    assert!(decode_token(&token, SECRET).is_err());
}

#[test]
fn tampered_token_is_rejected() {
    let claims = Claims::session(Uuid::now_v7(), "qa@test.com", "worker", Lifetime::Standard);
    let token = encode_token(&claims, SECRET).unwrap();

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    parts[2] = parts[2].chars().rev().collect();
    assert!(decode_token(&parts.join("."), SECRET).is_err());
    assert!(decode_token("not-a-token", SECRET).is_err());
}
