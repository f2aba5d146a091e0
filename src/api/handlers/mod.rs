//! API handlers for the Zodia admin service.
//!
//! This module organizes the service's route handlers: the admin auth
//! surface, the health endpoint, and the undocumented root probe.

pub mod admin;
pub mod health;
pub mod root;
