//! Exit codes for the CLI

use jarsign_core::ConfigError;
use jarsign_signing::SigningError;

/// Success
pub const SUCCESS: u8 = 0;

/// General error
pub const ERROR: u8 = 1;

/// Configuration error
pub const CONFIG_ERROR: u8 = 2;

/// Signing tool error
pub const SIGNING_ERROR: u8 = 3;

/// Archive read/write error
pub const ARCHIVE_ERROR: u8 = 4;

/// Pick the exit code for an error by inspecting its cause chain
pub fn from_error(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<SigningError>() {
            return if e.is_configuration() {
                CONFIG_ERROR
            } else if e.is_archive() {
                ARCHIVE_ERROR
            } else {
                SIGNING_ERROR
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return CONFIG_ERROR;
        }
    }
    ERROR
}
