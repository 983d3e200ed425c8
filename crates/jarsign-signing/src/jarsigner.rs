//! JDK `jarsigner` signer

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::{debug, info};

use crate::error::{Result, SigningError};
use crate::signer::{JarSigner, SignRequest, SignatureStatus};

/// Environment variable carrying the keystore password to the child process
const STOREPASS_ENV: &str = "JARSIGN_STOREPASS";

/// Environment variable carrying the key password to the child process
const KEYPASS_ENV: &str = "JARSIGN_KEYPASS";

/// Signer backed by the JDK `jarsigner` tool
///
/// Passwords are handed over through the child's environment
/// (`-storepass:env`), so they never appear in the process list.
#[derive(Debug, Clone)]
pub struct JarsignerTool {
    path: Option<PathBuf>,
}

impl JarsignerTool {
    /// Locate `jarsigner` in `$JAVA_HOME/bin` or on `PATH`
    pub fn new() -> Self {
        Self {
            path: Self::find_jarsigner(),
        }
    }

    /// Use an explicit `jarsigner` executable
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Resolved executable, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn find_jarsigner() -> Option<PathBuf> {
        let exe = if cfg!(windows) {
            "jarsigner.exe"
        } else {
            "jarsigner"
        };

        if let Some(java_home) = std::env::var_os("JAVA_HOME") {
            let candidate = Path::new(&java_home).join("bin").join(exe);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found jarsigner in JAVA_HOME");
                return Some(candidate);
            }
        }

        which::which("jarsigner").ok()
    }

    fn get_jarsigner(&self) -> Result<&Path> {
        self.path.as_deref().ok_or_else(|| SigningError::ToolNotFound {
            tool: "jarsigner".to_string(),
            hint: "Install a JDK or set JAVA_HOME".to_string(),
        })
    }

    fn sign_args(request: &SignRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-keystore".into(),
            request.keystore.into(),
            "-storepass:env".into(),
            STOREPASS_ENV.into(),
        ];

        if request.key_password.is_some() {
            args.push("-keypass:env".into());
            args.push(KEYPASS_ENV.into());
        }

        args.push("-signedjar".into());
        args.push(request.output.into());
        args.push(request.input.into());
        args.push(request.alias.into());
        args
    }

    fn parse_verify_output(success: bool, stdout: &str) -> SignatureStatus {
        if stdout.contains("jar is unsigned") {
            SignatureStatus::NotSigned
        } else if success && stdout.contains("jar verified") {
            SignatureStatus::Valid
        } else {
            SignatureStatus::Invalid
        }
    }

    fn failure_reason(output: &Output) -> String {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = format!("{}\n{}", stdout.trim(), stderr.trim());
        let reason = reason.trim();

        if reason.is_empty() {
            format!("jarsigner exited with {}", output.status)
        } else {
            reason.to_string()
        }
    }
}

impl Default for JarsignerTool {
    fn default() -> Self {
        Self::new()
    }
}

impl JarSigner for JarsignerTool {
    fn name(&self) -> &str {
        "jarsigner"
    }

    fn is_available(&self) -> bool {
        self.path.is_some()
    }

    fn sign(&self, request: &SignRequest<'_>) -> Result<()> {
        let jarsigner = self.get_jarsigner()?;

        let mut command = Command::new(jarsigner);
        command
            .args(Self::sign_args(request))
            .env(STOREPASS_ENV, request.store_password)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(key_password) = request.key_password {
            command.env(KEYPASS_ENV, key_password);
        }

        debug!(
            input = %request.input.display(),
            output = %request.output.display(),
            alias = request.alias,
            "running jarsigner"
        );

        let output = command.output().map_err(|e| SigningError::SigningFailed {
            path: request.input.to_path_buf(),
            reason: format!("could not run {}: {}", jarsigner.display(), e),
        })?;

        if !output.status.success() {
            return Err(SigningError::SigningFailed {
                path: request.input.to_path_buf(),
                reason: Self::failure_reason(&output),
            });
        }

        info!(
            "Signed {} with key {}",
            request.output.display(),
            request.alias
        );
        Ok(())
    }

    fn verify(&self, archive: &Path) -> Result<SignatureStatus> {
        let jarsigner = self.get_jarsigner()?;

        if !archive.exists() {
            return Err(SigningError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Archive not found: {}", archive.display()),
            )));
        }

        let output = Command::new(jarsigner)
            .arg("-J-Duser.language=en")
            .arg("-verify")
            .arg(archive)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let status = Self::parse_verify_output(output.status.success(), &stdout);
        debug!(archive = %archive.display(), %status, "verified archive");
        Ok(status)
    }
}
