//! Authentication primitives: credentials, password hashing, API tokens.
//!
//! Password material is stored as Argon2id PHC strings. Every registered
//! user receives exactly one API token at creation time; the token never
//! rotates and is revoked only by deleting the account.

use std::fmt;

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::RngCore;

use crate::domain::error::Error;

/// Minimum accepted password length for registration.
pub const PASSWORD_MIN: usize = 8;

/// Length in bytes of the random material behind an API token.
const TOKEN_BYTES: usize = 20;

/// Validation errors for login credentials and registration passwords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    EmptyUsername,
    EmptyPassword,
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Login request payload after shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: String,
}

impl LoginCredentials {
    /// Validate raw username/password input.
    pub fn try_from_parts(
        username: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        if username.trim().is_empty() {
            return Err(CredentialValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self {
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }

    /// Login name as supplied.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Plaintext password as supplied.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Reject registration passwords that are too short.
pub fn validate_registration_password(password: &str) -> Result<(), CredentialValidationError> {
    if password.is_empty() {
        return Err(CredentialValidationError::EmptyPassword);
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(CredentialValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    Ok(())
}

/// Hash a plaintext password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| Error::internal(format!("failed to encode password salt: {err}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::internal(format!("failed to hash password: {err}")))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` for a mismatch; only malformed stored hashes are
/// surfaced as errors.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| Error::internal(format!("stored password hash is malformed: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// API token issued when a user account is created.
///
/// Forty lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

/// Validation errors for [`AuthToken`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthTokenError {
    InvalidFormat,
}

impl fmt::Display for AuthTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "token must be 40 lowercase hex characters"),
        }
    }
}

impl std::error::Error for AuthTokenError {}

impl AuthToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Validate a token received from a client or loaded from storage.
    pub fn parse(raw: &str) -> Result<Self, AuthTokenError> {
        let expected_len = TOKEN_BYTES * 2;
        if raw.len() != expected_len || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AuthTokenError::InvalidFormat);
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }
}

impl AsRef<str> for AuthToken {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery").expect("hashable");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).expect("verifiable"));
        assert!(!verify_password("wrong password", &hash).expect("verifiable"));
    }

    #[rstest]
    fn malformed_stored_hash_is_an_internal_error() {
        let err = verify_password("anything", "not-a-phc-string").expect_err("malformed");
        assert_eq!(err.code(), crate::domain::ErrorCode::InternalError);
    }

    #[rstest]
    fn generated_tokens_are_forty_hex_chars_and_unique() {
        let a = AuthToken::generate();
        let b = AuthToken::generate();
        assert_eq!(a.as_ref().len(), 40);
        assert!(a.as_ref().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[rstest]
    #[case("short")]
    #[case("zz".repeat(20))]
    fn rejects_malformed_tokens(#[case] raw: String) {
        assert_eq!(
            AuthToken::parse(&raw).expect_err("invalid token"),
            AuthTokenError::InvalidFormat
        );
    }

    #[rstest]
    fn parse_normalises_token_case() {
        let token = AuthToken::generate();
        let upper = token.as_ref().to_ascii_uppercase();
        assert_eq!(AuthToken::parse(&upper).expect("valid"), token);
    }

    #[rstest]
    #[case("", "pw", CredentialValidationError::EmptyUsername)]
    #[case("alice", "", CredentialValidationError::EmptyPassword)]
    fn login_credentials_validate_shape(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: CredentialValidationError,
    ) {
        assert_eq!(
            LoginCredentials::try_from_parts(username, password).expect_err("invalid"),
            expected
        );
    }

    #[rstest]
    fn registration_password_enforces_minimum_length() {
        assert_eq!(
            validate_registration_password("seven77").expect_err("short"),
            CredentialValidationError::PasswordTooShort { min: PASSWORD_MIN }
        );
        validate_registration_password("eight888").expect("long enough");
    }
}
