#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unused_async)]

//! whoamid library — exposes core modules for embedding and testing.
//!
//! - `config` — configuration loading
//! - `imds` — instance identity metadata client
//! - `routes` — HTTP route handlers and router construction
//! - `state` — shared application state

pub mod config;
pub mod imds;
pub mod routes;
pub mod state;

// Re-export key types at crate root for convenience.
pub use config::Config;
pub use imds::{IdentityDocument, IdentityError, IdentitySource, ImdsClient};
pub use state::AppState;
