//! Connection configuration and credential handling.
//!
//! - `ConnectionConfig`: server address, timeouts and TLS settings
//! - `Credentials`: username and password, zeroed on drop
//! - `load_from_env`: reads both from `DOCTOSQL_RDBMS` or `DATABASE_URL`
//!
//! # Security
//! `ConnectionConfig` intentionally does NOT store passwords. Credentials
//! travel separately and are never logged or serialized.

mod connection;
mod credentials;

pub use connection::{
    ConnectionConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_MS,
    RDBMS_ENV_VAR, URL_ENV_VAR, from_json, from_url, load_from_env,
};
pub use credentials::Credentials;
