//! Project context shared by the signing commands

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use jarsign_core::config::{load_config_or_default, ArchiveConfig, Config};
use jarsign_core::{CredentialResolver, PropertyLookup, SigningCredentials};
use jarsign_signing::JarsignerTool;

/// Lookup options given on the command line
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    /// Extra `-P key=value` build properties
    pub properties: Vec<(String, String)>,
    /// Prefix override for property and environment lookup
    pub env_prefix: Option<String>,
    /// Skip property and environment detection
    pub no_auto_detect: bool,
}

/// Loaded configuration plus the directories relative paths resolve against
///
/// Paths from the configuration file are relative to the file's directory
/// (`root`); paths from the command line are relative to `cwd`.
#[derive(Debug)]
pub struct Project {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub root: PathBuf,
    pub cwd: PathBuf,
}

impl Project {
    /// Load the nearest configuration, falling back to defaults
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load the configuration nearest to `cwd`
    pub fn load_from(cwd: PathBuf) -> anyhow::Result<Self> {
        let (config, config_path) =
            load_config_or_default(&cwd).context("failed to load jarsign configuration")?;

        let root = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());

        Ok(Self {
            config,
            config_path,
            root,
            cwd,
        })
    }

    /// Resolve a path given on the command line
    pub fn cli_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Resolve a path read from the configuration file
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Credential resolver for project-level values
    pub fn resolver(&self, options: &LookupOptions) -> CredentialResolver {
        let mut defaults = self.config.signing.credentials();
        if let Some(file) = &defaults.keystore_file {
            defaults.keystore_file = Some(self.resolve_path(file));
        }

        let resolver = CredentialResolver::new(defaults);
        if options.no_auto_detect || !self.config.signing.auto_detect {
            debug!("credential auto-detection disabled");
            return resolver;
        }

        let mut properties: HashMap<String, String> = self.config.properties.clone();
        properties.extend(options.properties.iter().cloned());
        let prefix = options
            .env_prefix
            .clone()
            .or_else(|| self.config.env_prefix().map(str::to_string));

        resolver.with_auto_detect(PropertyLookup::from_process_env(properties), prefix)
    }

    /// Configured archive entry for the command-line path `archive`, if any
    pub fn archive_config(&self, archive: &Path) -> Option<&ArchiveConfig> {
        let archive = self.cli_path(archive);
        self.config
            .archives
            .iter()
            .find(|a| self.resolve_path(&a.path) == archive)
    }

    /// Per-archive credential overrides with the keystore path resolved
    pub fn archive_credentials(&self, archive: &ArchiveConfig) -> SigningCredentials {
        let mut credentials = archive.credentials();
        if let Some(file) = &credentials.keystore_file {
            credentials.keystore_file = Some(self.resolve_path(file));
        }
        credentials
    }

    /// Temp directory for `archive`, when one is configured
    pub fn temp_dir_for(&self, archive: &Path) -> Option<PathBuf> {
        let base = self.resolve_path(self.config.temp_dir.as_deref()?);
        let name = archive.file_name()?;
        Some(base.join(name))
    }

    /// The jarsigner to use: `--jarsigner`, then the configured path,
    /// then discovery
    pub fn signer(&self, explicit: Option<&Path>) -> JarsignerTool {
        if let Some(path) = explicit {
            return JarsignerTool::with_path(self.cli_path(path));
        }
        match self.config.signing.jarsigner.as_deref() {
            Some(path) => JarsignerTool::with_path(self.resolve_path(path)),
            None => JarsignerTool::new(),
        }
    }
}

/// Parse a `key=value` build property
pub fn parse_property(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty property name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(root: &str, config: Config) -> Project {
        Project {
            config,
            config_path: None,
            root: PathBuf::from(root),
            cwd: PathBuf::from(root),
        }
    }

    #[test]
    fn test_parse_property() {
        assert_eq!(
            parse_property("app.SIGN_KEY_ALIAS=release").unwrap(),
            ("app.SIGN_KEY_ALIAS".to_string(), "release".to_string())
        );
        assert_eq!(
            parse_property("SIGN_KEY_PASSWORD=a=b").unwrap(),
            ("SIGN_KEY_PASSWORD".to_string(), "a=b".to_string())
        );
        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=x").is_err());
    }

    #[test]
    fn test_archive_config_matches_resolved_path() {
        let config = Config {
            archives: vec![ArchiveConfig {
                path: PathBuf::from("build/libs/app.jar"),
                excludes: vec!["META-INF/**".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let project = project("/work", config);

        assert!(project
            .archive_config(Path::new("/work/build/libs/app.jar"))
            .is_some());
        assert!(project.archive_config(Path::new("other.jar")).is_none());
    }

    #[test]
    fn test_temp_dir_for() {
        let mut config = Config::default();
        assert!(project("/work", config.clone())
            .temp_dir_for(Path::new("app.jar"))
            .is_none());

        config.temp_dir = Some(PathBuf::from("build/tmp/jarsign"));
        assert_eq!(
            project("/work", config).temp_dir_for(Path::new("build/libs/app.jar")),
            Some(PathBuf::from("/work/build/tmp/jarsign/app.jar"))
        );
    }

    #[test]
    fn test_resolver_uses_cli_properties() {
        let mut config = Config::default();
        config.name = Some("app".to_string());
        config
            .properties
            .insert("SIGN_KEY_ALIAS".to_string(), "from-config".to_string());
        let project = project("/work", config);

        let options = LookupOptions {
            properties: vec![("app.SIGN_KEY_ALIAS".to_string(), "from-cli".to_string())],
            ..Default::default()
        };
        let detected = project.resolver(&options).detected();
        assert_eq!(detected.alias.as_deref(), Some("from-cli"));

        let options = LookupOptions {
            no_auto_detect: true,
            ..options
        };
        assert_eq!(project.resolver(&options).detected().alias, None);
    }

    #[test]
    fn test_relative_keystore_resolves_against_root() {
        let mut config = Config::default();
        config.signing.keystore_file = Some(PathBuf::from("release.jks"));
        config.signing.auto_detect = false;
        let project = project("/work", config);

        let creds = project.resolver(&LookupOptions::default()).project();
        assert_eq!(creds.keystore_file, Some(PathBuf::from("/work/release.jks")));
    }

    #[test]
    fn test_paths_from_subdirectory() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let sub = root.join("sub");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(
            root.join("jarsign.yaml"),
            "temp_dir: build/tmp\nsigning:\n  jarsigner: tools/jarsigner\narchives:\n  - path: sub/app.jar\n",
        )
        .unwrap();

        let project = Project::load_from(sub.clone()).unwrap();
        assert_eq!(project.root, root);
        assert_eq!(project.config_path, Some(root.join("jarsign.yaml")));

        assert_eq!(project.cli_path(Path::new("app.jar")), sub.join("app.jar"));
        assert_eq!(project.resolve_path(Path::new("sub/app.jar")), sub.join("app.jar"));
        assert!(project.archive_config(Path::new("app.jar")).is_some());
        assert!(project.archive_config(Path::new("sub/app.jar")).is_none());

        assert_eq!(
            project.temp_dir_for(&sub.join("app.jar")),
            Some(root.join("build/tmp/app.jar"))
        );
        assert_eq!(
            project.signer(None).path(),
            Some(root.join("tools/jarsigner").as_path())
        );
        assert_eq!(
            project.signer(Some(Path::new("bin/jarsigner"))).path(),
            Some(sub.join("bin/jarsigner").as_path())
        );
    }
}
