//! jarsign Signing - selective signing of Java archives
//!
//! The pipeline signs a subset of an archive's entries and leaves the rest
//! byte-for-byte untouched:
//! - `partition`: split an archive into a signable subset and preserved entries
//! - `keystore`: materialize inline base64 keystores as temporary files
//! - `signer` / `jarsigner`: the external signing tool
//! - `merge`: recombine the signed subset with the preserved entries
//! - `task`: the orchestrating signing task

pub mod archive;
pub mod error;
pub mod jarsigner;
pub mod keystore;
pub mod merge;
pub mod partition;
pub mod signer;
pub mod task;

pub use error::{Result, SigningError};
pub use jarsigner::JarsignerTool;
pub use keystore::{materialize, MaterializedKeystore};
pub use merge::merge;
pub use partition::{partition, PreservedEntries, PreservedEntry};
pub use signer::{JarSigner, SignRequest, SignatureStatus};
pub use task::{SignOutcome, SignReport, SignTask, SignTaskBuilder};
