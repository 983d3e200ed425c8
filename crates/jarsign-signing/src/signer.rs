//! External signer trait and common types

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parameters for one invocation of an external signer
#[derive(Debug, Clone, Copy)]
pub struct SignRequest<'a> {
    /// Alias of the signing key inside the keystore
    pub alias: &'a str,
    /// Keystore password
    pub store_password: &'a str,
    /// Private key password; the signer's own default applies when absent
    pub key_password: Option<&'a str>,
    /// Keystore file
    pub keystore: &'a Path,
    /// Archive to sign
    pub input: &'a Path,
    /// Where the signed archive is written
    pub output: &'a Path,
}

/// Status of a signature verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    /// Signature is valid
    Valid,
    /// Signature is invalid
    Invalid,
    /// Not signed
    NotSigned,
}

impl std::fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "Valid"),
            Self::Invalid => write!(f, "Invalid"),
            Self::NotSigned => write!(f, "Not Signed"),
        }
    }
}

/// A tool that signs Java archives
///
/// Implementations must not modify `request.input` and must either produce
/// a complete archive at `request.output` or fail.
pub trait JarSigner {
    /// Get the name of this signer
    fn name(&self) -> &str;

    /// Check if this signer can run on the current system
    fn is_available(&self) -> bool {
        true
    }

    /// Sign `request.input` into `request.output`
    fn sign(&self, request: &SignRequest<'_>) -> Result<()>;

    /// Verify the signature on an archive
    fn verify(&self, archive: &Path) -> Result<SignatureStatus>;
}
