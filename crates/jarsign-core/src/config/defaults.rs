//! Default configuration values

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "jarsign.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "jarsign.toml";

/// Alternative configuration file name
pub const ALT_CONFIG_FILE: &str = ".jarsign.yaml";

/// Name of the materialized keystore inside a run's temp directory
pub const TEMP_KEYSTORE_NAME: &str = "keystore";

/// Directory under the system temp dir used when none is configured
pub const DEFAULT_TEMP_SUBDIR: &str = "jarsign";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_YAML,
        DEFAULT_CONFIG_TOML,
        ALT_CONFIG_FILE,
        ".jarsign.toml",
    ]
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# jarsign configuration

name: myproject

signing:
  # Credentials may also come from SIGN_KEY_ALIAS, SIGN_KEY_PASSWORD,
  # SIGN_KEYSTORE_PASSWORD and SIGN_KEYSTORE_DATA (optionally prefixed
  # with "<name>.")
  auto_detect: true
  keystore_file: release.jks

archives:
  - path: build/libs/app.jar
    excludes:
      - "META-INF/**"
"#;
