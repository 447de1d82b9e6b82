//! # Quire Auth Module
//!
//! Password hashing for auth-enabled collections, JWT issue/validation,
//! one-time reset tokens with their mail, and the `User` principal handed
//! to policies and hooks.

pub mod crypto;
pub mod email;
pub mod errors;
pub mod jwt;
pub mod reset;
pub mod user;

pub use crypto::PasswordPolicy;
pub use email::{EmailSender, EmailTemplate, LogEmailSender, MockEmailSender};
pub use errors::{AuthError, AuthResult};
pub use jwt::{JwtClaims, JwtConfig, JwtManager};
pub use reset::{ResetClaim, ResetTokenStore};
pub use user::User;
