//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod schemas;
pub mod search;
pub mod state;
pub mod stream;

pub use error::ApiResult;
