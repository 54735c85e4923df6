//! Acervo Client - hosted backend client
//!
//! Session handling and the REST-backed implementations of the access
//! sources.

pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod session;

pub use config::ClientConfig;
pub use directory::RestDirectory;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use session::{Session, SessionStore};
