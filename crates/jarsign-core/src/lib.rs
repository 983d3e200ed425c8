//! jarsign Core - configuration, credentials and entry patterns
//!
//! This crate holds everything that is decided before an archive is touched:
//! - Configuration file discovery and loading (`jarsign.yaml` / `jarsign.toml`)
//! - Layered signing credentials with property and environment lookup
//! - Include/exclude pattern sets that select which entries get signed

pub mod config;
pub mod credentials;
pub mod error;
pub mod patterns;

pub use config::{load_config, load_config_or_default, Config};
pub use credentials::{CredentialResolver, KeystoreSource, PropertyLookup, SigningCredentials};
pub use error::{ConfigError, Result};
pub use patterns::PatternSet;
