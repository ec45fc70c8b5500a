//! Authentication Module
//! Mission: Issue and verify signed bearer tokens over a registered-user store

pub mod api;
pub mod models;
pub mod token;
pub mod user_store;

pub use api::AuthState;
pub use token::{TokenCodec, TokenError};
pub use user_store::UserStore;
