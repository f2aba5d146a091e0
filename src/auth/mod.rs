//! Credential primitives for the admin authentication flow.
//!
//! Each submodule owns one factor or token type; the HTTP handlers in
//! `api::handlers::admin` compose them. Nothing in here reads the
//! environment: secrets arrive through the configuration object built at
//! startup so every piece can be constructed directly in tests.

pub mod csrf;
pub mod password;
pub mod recovery;
pub mod session;
pub mod totp;
