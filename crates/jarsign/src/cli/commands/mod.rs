//! CLI commands

mod init;
mod project;
mod run;
mod sign;
mod status;
mod verify;

pub use init::InitCommand;
pub use run::RunCommand;
pub use sign::SignCommand;
pub use status::StatusCommand;
pub use verify::VerifyCommand;
