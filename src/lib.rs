//! TST Gateway Library
//!
//! Exposes the identity and portal modules for use by the service
//! binaries and integration tests.

pub mod auth;
pub mod config;
pub mod middleware;
pub mod portal;
