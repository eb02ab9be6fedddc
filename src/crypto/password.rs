use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;

#[cfg(not(test))]
pub const PBKDF2_ITERATIONS: u32 = 600_000;
// Keeps the registration-heavy test suite fast; stored hashes carry their own count.
#[cfg(test)]
pub const PBKDF2_ITERATIONS: u32 = 1_000;

pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const SCHEME: &str = "pbkdf2_sha256";

/// Hash a password with PBKDF2-SHA256 and a fresh random salt.
///
/// Output format: `pbkdf2_sha256$<iterations>$<salt>$<hash>` with
/// unpadded standard base64 for salt and hash.
pub fn hash_password(password: &str) -> String {
    let salt = generate_salt();
    let hash = derive(password, &salt, PBKDF2_ITERATIONS);
    format!(
        "{SCHEME}${PBKDF2_ITERATIONS}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// [`hash_password`] on tokio's blocking pool, so key derivation never
/// occupies an async worker thread.
pub async fn hash_password_blocking(password: String) -> Result<String, CryptoError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| CryptoError::HashTask(e.to_string()))
}

/// Check a password against a stored hash in constant time.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedHash);
    };
    if scheme != SCHEME {
        return Err(CryptoError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| CryptoError::MalformedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(hash)
        .map_err(|_| CryptoError::MalformedHash)?;

    let actual = derive(password, &salt, iterations);
    Ok(actual[..].ct_eq(&expected[..]).into())
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Generate a cryptographically random salt
fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored).unwrap());
        assert!(!verify_password("wrong horse", &stored).unwrap());
    }

    #[tokio::test]
    async fn blocking_hash_verifies() {
        let stored = hash_password_blocking("correct horse".into()).await.unwrap();
        assert!(verify_password("correct horse", &stored).unwrap());
    }

    #[test]
    fn same_password_different_salts() {
        assert_ne!(hash_password("password"), hash_password("password"));
    }

    #[test]
    fn hash_never_contains_plaintext() {
        let stored = hash_password("defaultpass123");
        assert!(!stored.contains("defaultpass123"));
        assert!(stored.starts_with("pbkdf2_sha256$"));
    }

    #[test]
    fn malformed_hash_rejected() {
        assert!(matches!(
            verify_password("x", "plaintext"),
            Err(CryptoError::MalformedHash)
        ));
        assert!(matches!(
            verify_password("x", "md5$1$a$b"),
            Err(CryptoError::MalformedHash)
        ));
    }
}
