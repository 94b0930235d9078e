//! Remote authority client.
//!
//! The authority is the system of record for credentials and session
//! tokens: it verifies logins, accepts or rejects tokens, and sends
//! password-reset mail. This module consumes that contract and implements
//! none of it.
//!
//! Login failures cross this boundary only as the closed `AuthErrorCode`
//! set; raw transport errors are mapped here and never surface as free
//! text.

pub mod client;
pub mod error;

pub use client::{Authority, HttpAuthority};
pub use error::{AuthErrorCode, AuthorityError};
