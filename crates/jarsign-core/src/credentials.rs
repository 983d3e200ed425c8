//! Signing credentials and their layered resolution
//!
//! Credentials come from three layers, later layers winning field by field:
//! 1. Values detected from build properties and environment variables
//! 2. Project-wide defaults from the configuration file
//! 3. Explicit per-archive (task-level) values

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::error::{ConfigError, Result};

/// Key holding the key alias
pub const KEY_ALIAS: &str = "SIGN_KEY_ALIAS";
/// Key holding the private key password
pub const KEY_PASSWORD: &str = "SIGN_KEY_PASSWORD";
/// Key holding the keystore password
pub const KEYSTORE_PASSWORD: &str = "SIGN_KEYSTORE_PASSWORD";
/// Key holding base64 encoded keystore data
pub const KEYSTORE_DATA: &str = "SIGN_KEYSTORE_DATA";

/// Credentials needed to sign an archive
///
/// Every field is either present or absent; an empty string is a present value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SigningCredentials {
    /// Alias of the key pair inside the keystore
    pub alias: Option<String>,
    /// Keystore password
    pub store_password: Option<String>,
    /// Private key password
    pub key_password: Option<String>,
    /// Path to a keystore file
    pub keystore_file: Option<PathBuf>,
    /// Base64 encoded keystore contents
    pub keystore_data: Option<String>,
}

/// Where the keystore comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeystoreSource {
    /// An existing keystore file
    File(PathBuf),
    /// Base64 encoded keystore bytes
    Data(String),
}

impl SigningCredentials {
    /// Layer `overrides` on top of `self`; present override fields win
    ///
    /// The keystore file and inline data form one setting: a layer that
    /// names either of them replaces both from the layer below.
    pub fn merge(mut self, overrides: &SigningCredentials) -> Self {
        fn take<T: Clone>(base: &mut Option<T>, over: &Option<T>) {
            if over.is_some() {
                base.clone_from(over);
            }
        }

        take(&mut self.alias, &overrides.alias);
        take(&mut self.store_password, &overrides.store_password);
        take(&mut self.key_password, &overrides.key_password);
        if overrides.keystore_file.is_some() || overrides.keystore_data.is_some() {
            self.keystore_file.clone_from(&overrides.keystore_file);
            self.keystore_data.clone_from(&overrides.keystore_data);
        }
        self
    }

    /// Whether enough information is present to attempt signing
    pub fn is_sufficient(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of the fields that prevent signing
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.alias.is_none() {
            missing.push("alias");
        }
        if self.store_password.is_none() {
            missing.push("store password");
        }
        if self.key_password.is_none() {
            missing.push("key password");
        }
        if self.keystore_file.is_none() && self.keystore_data.is_none() {
            missing.push("keystore");
        }
        missing
    }

    /// The configured keystore source
    ///
    /// Fails when both a file and inline data are set.
    pub fn keystore_source(&self) -> Result<Option<KeystoreSource>> {
        match (&self.keystore_file, &self.keystore_data) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingKeystore),
            (Some(file), None) => Ok(Some(KeystoreSource::File(file.clone()))),
            (None, Some(data)) => Ok(Some(KeystoreSource::Data(data.clone()))),
            (None, None) => Ok(None),
        }
    }
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact<T>(value: &Option<T>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("SigningCredentials")
            .field("alias", &self.alias)
            .field("store_password", &redact(&self.store_password))
            .field("key_password", &redact(&self.key_password))
            .field("keystore_file", &self.keystore_file)
            .field("keystore_data", &redact(&self.keystore_data))
            .finish()
    }
}

/// Build properties and environment variables consulted during detection
#[derive(Debug, Clone, Default)]
pub struct PropertyLookup {
    properties: HashMap<String, String>,
    env: HashMap<String, String>,
}

impl PropertyLookup {
    /// Create a lookup from explicit property and environment maps
    pub fn new(properties: HashMap<String, String>, env: HashMap<String, String>) -> Self {
        Self { properties, env }
    }

    /// Create a lookup over the current process environment
    pub fn from_process_env(properties: HashMap<String, String>) -> Self {
        Self {
            properties,
            env: std::env::vars().collect(),
        }
    }

    /// Find `key`, preferring `<prefix>.<key>` over the bare key and
    /// build properties over environment variables at each level
    pub fn find(&self, prefix: Option<&str>, key: &str) -> Option<&str> {
        let prefixed = prefix.map(|p| format!("{}.{}", p, key));

        prefixed
            .as_deref()
            .and_then(|k| self.properties.get(k).or_else(|| self.env.get(k)))
            .or_else(|| self.properties.get(key))
            .or_else(|| self.env.get(key))
            .map(String::as_str)
    }
}

/// Resolves the final credentials for one signing run
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    defaults: SigningCredentials,
    lookup: Option<PropertyLookup>,
    prefix: Option<String>,
}

impl CredentialResolver {
    /// Create a resolver with project-wide defaults
    pub fn new(defaults: SigningCredentials) -> Self {
        Self {
            defaults,
            lookup: None,
            prefix: None,
        }
    }

    /// Also detect credentials from build properties and the environment
    pub fn with_auto_detect(mut self, lookup: PropertyLookup, prefix: Option<String>) -> Self {
        self.lookup = Some(lookup);
        self.prefix = prefix;
        self
    }

    /// Credentials found through property/environment detection
    pub fn detected(&self) -> SigningCredentials {
        let Some(lookup) = &self.lookup else {
            return SigningCredentials::default();
        };
        let prefix = self.prefix.as_deref();
        let find = |key| lookup.find(prefix, key).map(str::to_string);

        SigningCredentials {
            alias: find(KEY_ALIAS),
            store_password: find(KEYSTORE_PASSWORD),
            key_password: find(KEY_PASSWORD),
            keystore_file: None,
            keystore_data: find(KEYSTORE_DATA),
        }
    }

    /// Project-level credentials: detected values under configured defaults
    pub fn project(&self) -> SigningCredentials {
        self.detected().merge(&self.defaults)
    }

    /// Final credentials for a run with the given task-level overrides
    #[instrument(skip_all, fields(prefix = ?self.prefix))]
    pub fn resolve(&self, overrides: &SigningCredentials) -> SigningCredentials {
        let resolved = self.project().merge(overrides);
        debug!(
            sufficient = resolved.is_sufficient(),
            missing = ?resolved.missing_fields(),
            "resolved signing credentials"
        );
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> SigningCredentials {
        SigningCredentials {
            alias: Some("release".to_string()),
            store_password: Some("store".to_string()),
            key_password: Some("key".to_string()),
            keystore_file: Some(PathBuf::from("release.jks")),
            keystore_data: None,
        }
    }

    fn lookup(properties: &[(&str, &str)], env: &[(&str, &str)]) -> PropertyLookup {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>()
        };
        PropertyLookup::new(to_map(properties), to_map(env))
    }

    #[test]
    fn test_sufficient_credentials() {
        assert!(full().is_sufficient());
        assert!(full().missing_fields().is_empty());
    }

    #[test]
    fn test_missing_key_password_and_keystore() {
        let creds = SigningCredentials {
            alias: Some("release".to_string()),
            store_password: Some("store".to_string()),
            ..Default::default()
        };
        assert!(!creds.is_sufficient());
        assert_eq!(creds.missing_fields(), vec!["key password", "keystore"]);
    }

    #[test]
    fn test_keystore_data_is_enough_source() {
        let creds = SigningCredentials {
            keystore_file: None,
            keystore_data: Some("AAAA".to_string()),
            ..full()
        };
        assert!(creds.is_sufficient());
        assert_eq!(
            creds.keystore_source().unwrap(),
            Some(KeystoreSource::Data("AAAA".to_string()))
        );
    }

    #[test]
    fn test_conflicting_keystore_source() {
        let creds = SigningCredentials {
            keystore_data: Some("AAAA".to_string()),
            ..full()
        };
        assert!(creds.is_sufficient());
        assert!(matches!(
            creds.keystore_source(),
            Err(ConfigError::ConflictingKeystore)
        ));
    }

    #[test]
    fn test_merge_is_presence_based() {
        let base = full();
        let overrides = SigningCredentials {
            alias: Some("other".to_string()),
            ..Default::default()
        };

        let merged = base.merge(&overrides);
        assert_eq!(merged.alias.as_deref(), Some("other"));
        assert_eq!(merged.store_password.as_deref(), Some("store"));
        assert_eq!(merged.keystore_file, Some(PathBuf::from("release.jks")));
    }

    #[test]
    fn test_keystore_layer_replaces_other_source() {
        let detected = SigningCredentials {
            keystore_data: Some("AAAA".to_string()),
            ..Default::default()
        };
        let configured = SigningCredentials {
            keystore_file: Some(PathBuf::from("release.jks")),
            ..Default::default()
        };

        let merged = detected.clone().merge(&configured);
        assert_eq!(merged.keystore_file, Some(PathBuf::from("release.jks")));
        assert_eq!(merged.keystore_data, None);
        assert_eq!(
            merged.keystore_source().unwrap(),
            Some(KeystoreSource::File(PathBuf::from("release.jks")))
        );

        let merged = configured.merge(&detected);
        assert_eq!(merged.keystore_file, None);
        assert_eq!(merged.keystore_data.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_conflict_within_one_layer_is_kept() {
        let both = SigningCredentials {
            keystore_file: Some(PathBuf::from("other.jks")),
            keystore_data: Some("AAAA".to_string()),
            ..Default::default()
        };
        let merged = full().merge(&both);
        assert!(matches!(
            merged.keystore_source(),
            Err(ConfigError::ConflictingKeystore)
        ));
    }

    #[test]
    fn test_resolver_configured_keystore_file_wins_over_detected_data() {
        let detected = lookup(&[], &[("SIGN_KEYSTORE_DATA", "AAAA")]);
        let defaults = SigningCredentials {
            keystore_file: Some(PathBuf::from("release.jks")),
            ..Default::default()
        };
        let resolver = CredentialResolver::new(defaults).with_auto_detect(detected, None);

        let creds = resolver.resolve(&SigningCredentials::default());
        assert_eq!(
            creds.keystore_source().unwrap(),
            Some(KeystoreSource::File(PathBuf::from("release.jks")))
        );
    }

    #[test]
    fn test_empty_string_is_present() {
        let merged = full().merge(&SigningCredentials {
            key_password: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(merged.key_password.as_deref(), Some(""));
        assert!(merged.is_sufficient());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = SigningCredentials {
            keystore_data: Some("c2VjcmV0".to_string()),
            ..full()
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("\"store\""));
        assert!(!debug.contains("\"key\""));
        assert!(!debug.contains("c2VjcmV0"));
        assert!(debug.contains("release"));
    }

    #[test]
    fn test_lookup_precedence() {
        let lookup = lookup(
            &[("SIGN_KEY_ALIAS", "bare-prop")],
            &[
                ("app.SIGN_KEY_ALIAS", "prefixed-env"),
                ("SIGN_KEY_ALIAS", "bare-env"),
            ],
        );
        assert_eq!(lookup.find(Some("app"), KEY_ALIAS), Some("prefixed-env"));
        assert_eq!(lookup.find(Some("other"), KEY_ALIAS), Some("bare-prop"));
        assert_eq!(lookup.find(None, KEY_ALIAS), Some("bare-prop"));
        assert_eq!(lookup.find(None, KEY_PASSWORD), None);
    }

    #[test]
    fn test_lookup_prefers_prefixed_property() {
        let lookup = lookup(
            &[("app.SIGN_KEY_ALIAS", "prefixed-prop")],
            &[("app.SIGN_KEY_ALIAS", "prefixed-env")],
        );
        assert_eq!(lookup.find(Some("app"), KEY_ALIAS), Some("prefixed-prop"));
    }

    #[test]
    fn test_resolver_layers() {
        let detected = lookup(
            &[],
            &[
                ("SIGN_KEY_ALIAS", "env-alias"),
                ("SIGN_KEY_PASSWORD", "env-key"),
                ("SIGN_KEYSTORE_PASSWORD", "env-store"),
                ("SIGN_KEYSTORE_DATA", "AAAA"),
            ],
        );
        let defaults = SigningCredentials {
            alias: Some("config-alias".to_string()),
            ..Default::default()
        };
        let resolver =
            CredentialResolver::new(defaults).with_auto_detect(detected, Some("app".to_string()));

        let overrides = SigningCredentials {
            key_password: Some("task-key".to_string()),
            ..Default::default()
        };
        let creds = resolver.resolve(&overrides);

        assert_eq!(creds.alias.as_deref(), Some("config-alias"));
        assert_eq!(creds.store_password.as_deref(), Some("env-store"));
        assert_eq!(creds.key_password.as_deref(), Some("task-key"));
        assert_eq!(creds.keystore_data.as_deref(), Some("AAAA"));
        assert!(creds.is_sufficient());
    }

    #[test]
    fn test_resolver_without_detection_ignores_environment() {
        let resolver = CredentialResolver::new(SigningCredentials::default());
        assert_eq!(resolver.detected(), SigningCredentials::default());
        assert!(!resolver.resolve(&SigningCredentials::default()).is_sufficient());
    }
}
