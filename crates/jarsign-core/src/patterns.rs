//! Include/exclude patterns selecting which archive entries get signed
//!
//! Patterns use Ant-style globs relative to the archive root: `*` and `?`
//! stay within one path segment, `**` spans any number of segments, and a
//! pattern ending in `/` selects everything below that directory.

use std::collections::BTreeSet;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Set of include and exclude globs
///
/// An empty set (no includes, no excludes) matches every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    includes: BTreeSet<String>,
    excludes: BTreeSet<String>,
}

impl PatternSet {
    /// Create an empty pattern set that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Add include patterns
    pub fn include<I, S>(&mut self, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add exclude patterns
    pub fn exclude<I, S>(&mut self, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Include patterns
    pub fn includes(&self) -> &BTreeSet<String> {
        &self.includes
    }

    /// Exclude patterns
    pub fn excludes(&self) -> &BTreeSet<String> {
        &self.excludes
    }

    /// Whether this set matches every entry
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Compile the globs into a matcher
    pub fn compile(&self) -> Result<PatternMatcher> {
        let includes = if self.includes.is_empty() {
            None
        } else {
            Some(build_glob_set(&self.includes)?)
        };
        let excludes = build_glob_set(&self.excludes)?;

        debug!(
            includes = self.includes.len(),
            excludes = self.excludes.len(),
            "compiled entry patterns"
        );

        Ok(PatternMatcher {
            includes,
            excludes,
            matches_everything: self.is_empty(),
        })
    }
}

/// Compiled form of a [`PatternSet`]
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    includes: Option<GlobSet>,
    excludes: GlobSet,
    matches_everything: bool,
}

impl PatternMatcher {
    /// Whether the entry at `path` is selected for signing
    pub fn is_match(&self, path: &str) -> bool {
        let path = normalize(path);
        let included = self
            .includes
            .as_ref()
            .map_or(true, |set| set.is_match(path.as_str()));
        included && !self.excludes.is_match(path.as_str())
    }

    /// True when built from an empty pattern set
    pub fn matches_everything(&self) -> bool {
        self.matches_everything
    }
}

/// Check that a single pattern compiles
pub fn validate_pattern(pattern: &str) -> Result<()> {
    compile_glob(pattern).map(|_| ())
}

fn build_glob_set(patterns: &BTreeSet<String>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern)?);
    }
    builder.build().map_err(|source| ConfigError::InvalidPattern {
        pattern: patterns.iter().cloned().collect::<Vec<_>>().join(", "),
        source,
    })
}

fn compile_glob(pattern: &str) -> Result<globset::Glob> {
    let mut translated = normalize(pattern);
    if translated.ends_with('/') {
        translated.push_str("**");
    }

    GlobBuilder::new(&translated)
        .literal_separator(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}
