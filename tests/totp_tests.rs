use totp_rs::{Algorithm, Secret, TOTP};

use qcontrol::auth::totp::Authenticator;

/// A timestamp on a step boundary.
const NOW: u64 = 1_760_000_010;

fn authenticator() -> Authenticator {
    Authenticator::new("Quality Control")
}

fn code_at(secret: &str, time: u64) -> String {
    let bytes = Secret::Encoded(secret.to_string()).to_bytes().unwrap();
    TOTP::new(Algorithm::SHA1, 6, 0, 30, bytes, None, String::new())
        .unwrap()
        .generate(time)
}

#[test]
fn generated_secrets_are_base32_and_unique() {
    let auth = authenticator();
    let a = auth.generate_secret();
    let b = auth.generate_secret();

    assert_ne!(a, b);
    // 20 bytes -> 32 base32 characters, no padding
    assert_eq!(a.len(), 32);
    assert!(Secret::Encoded(a).to_bytes().is_ok());
}

#[test]
fn codes_within_two_steps_are_accepted() {
    let auth = authenticator();
    let secret = auth.generate_secret();

    for offset in [-60i64, -30, 0, 30, 60] {
        let at = NOW.checked_add_signed(offset).unwrap();
        let code = code_at(&secret, at);
        assert!(
            auth.verify_at(&secret, &code, NOW).unwrap(),
            "code from {offset}s should be accepted"
        );
    }
}

#[test]
fn codes_outside_the_window_are_rejected() {
    let auth = authenticator();
    let secret = auth.generate_secret();

    for offset in [-600i64, -120, 120, 600] {
        let at = NOW.checked_add_signed(offset).unwrap();
        let code = code_at(&secret, at);
        // A far-away code can collide with one in the window; skip that case
        let collides = (-2i64..=2)
            .any(|step| code_at(&secret, NOW.checked_add_signed(step * 30).unwrap()) == code);
        if !collides {
            assert!(!auth.verify_at(&secret, &code, NOW).unwrap());
        }
    }
}

#[test]
fn malformed_codes_never_verify() {
    let auth = authenticator();
    let secret = auth.generate_secret();
    let code = code_at(&secret, NOW);

    assert!(!auth.verify_at(&secret, "", NOW).unwrap());
    assert!(!auth.verify_at(&secret, "12345", NOW).unwrap());
    assert!(!auth.verify_at(&secret, "abcdef", NOW).unwrap());
    assert!(!auth.verify_at(&secret, &format!("{code}0"), NOW).unwrap());

    let spaced = format!("{} {}", &code[..3], &code[3..]);
    assert!(auth.verify_at(&secret, &spaced, NOW).unwrap());
}

#[test]
fn invalid_secret_is_an_error() {
    let auth = authenticator();
    assert!(auth.verify_at("not base32 at all!", "123456", NOW).is_err());
}

#[test]
fn provisioning_carries_uri_and_qr() {
    let auth = authenticator();
    let secret = auth.generate_secret();

    let p = auth.provision(&secret, "qa@test.com").unwrap();
    assert_eq!(p.secret, secret);
    assert!(p.otpauth_url.starts_with("otpauth://totp/"));
    assert!(p.otpauth_url.contains(&format!("secret={secret}")));
    assert!(p.otpauth_url.contains("issuer=Quality"));
    assert!(p.qr_code.starts_with("data:image/png;base64,"));
    assert!(p.qr_code.len() > 100);
}
