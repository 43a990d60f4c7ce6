//! picoles-core: configuration and input validation
//!
//! Shared by the data-access crate; holds nothing that talks to a database.

pub mod config;
pub mod validation;

pub use config::{load_dotenv, project_root, Backend, DatabaseConfig, NetworkedConfig, PicolesConfig};
pub use validation::ValidationError;
