//! Client for the hosted backend: auth, `PostgREST` rows and object storage.

pub mod auth;
pub mod client;
pub mod error;
mod retry;
pub mod rows;
pub mod storage;

pub use auth::{
    handle_callback, AuthError, AuthUser, CallbackOutcome, CallbackParams, Provider, Session,
    SessionStore, SignInRequest, HOME_PATH, LOGIN_TIMEOUT,
};
pub use client::SupabaseClient;
pub use error::SupabaseError;
