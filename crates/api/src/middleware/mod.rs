//! Authentication middleware extractors.
//!
//! - [`auth::CurrentUser`] -- Extracts the authenticated user from the
//!   sealed session cookie.

pub mod auth;
