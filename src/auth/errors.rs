//! Failures raised by password hashing, bearer tokens and the reset flow.

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Unknown email and wrong password share this variant
    #[error("The email or password provided is incorrect")]
    InvalidCredentials,

    #[error("Password rejected: {0}")]
    WeakPassword(String),

    #[error("'{0}' is not an auth-enabled collection")]
    NotAuthCollection(String),

    /// The token is valid but its user document is gone
    #[error("The user for this token no longer exists")]
    UnknownUser,

    #[error("No signing secret configured")]
    NotConfigured,

    #[error("Token could not be decoded")]
    MalformedToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token signature does not verify")]
    InvalidSignature,

    #[error("Password hashing failed")]
    HashingFailed,

    #[error("Token signing failed")]
    TokenGenerationFailed,

    /// Unknown, already used or expired
    #[error("Password reset token is invalid or has expired")]
    InvalidResetToken,

    #[error("Failed to send email: {0}")]
    EmailFailed(String),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        use AuthError::*;
        match self {
            WeakPassword(_) | MalformedToken | NotAuthCollection(_) | InvalidResetToken => 400,
            InvalidCredentials | UnknownUser | TokenExpired | InvalidSignature => 401,
            NotConfigured | HashingFailed | TokenGenerationFailed | EmailFailed(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        use AuthError::*;
        match self {
            InvalidCredentials => "INVALID_CREDENTIALS",
            WeakPassword(_) => "WEAK_PASSWORD",
            NotAuthCollection(_) => "NOT_AUTH_COLLECTION",
            UnknownUser => "UNKNOWN_USER",
            NotConfigured => "AUTH_NOT_CONFIGURED",
            MalformedToken => "MALFORMED_TOKEN",
            TokenExpired => "TOKEN_EXPIRED",
            InvalidSignature => "INVALID_SIGNATURE",
            HashingFailed => "HASHING_FAILED",
            TokenGenerationFailed => "TOKEN_GENERATION_FAILED",
            InvalidResetToken => "INVALID_RESET_TOKEN",
            EmailFailed(_) => "EMAIL_FAILED",
        }
    }
}
