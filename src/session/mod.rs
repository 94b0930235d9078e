//! Session model and persistence.
//!
//! This module provides:
//! - `Session`: the authenticated unit of work (profile snapshot, bearer
//!   token, absolute expiry)
//! - `SessionStore`: durable storage of at most one session record
//!
//! Expiry policy lives in the controller; the store is pure data access.

pub mod model;
pub mod store;

pub use model::{AuthState, Session, UserProfile};
pub use store::SessionStore;
