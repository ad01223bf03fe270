use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{SeveritySet, SeverityTag};

pub const DEFAULT_HEADER_PREFIX: &str = "File ";
pub const DEFAULT_PATH_FRAGMENT: &str = "application\\source\\";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy path_fragment cannot be empty")]
    EmptyPathFragment,
    #[error("policy header_prefix cannot be empty")]
    EmptyHeaderPrefix,
    #[error("require_source_extension is set but source_extensions is empty")]
    NoSourceExtensions,
    #[error("invalid source extension: {0:?}")]
    InvalidExtension(String),
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

/// Which blocks and lines of a lint report survive filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    /// Case-insensitive fragment a header must contain to be relevant.
    pub path_fragment: String,
    pub require_source_extension: bool,
    /// Extensions without the dot, e.g. `c`.
    pub source_extensions: Vec<String>,
    /// Blocks whose header carries one of these tags are excluded; body lines too.
    pub drop_severities: SeveritySet,
    /// Body lines carrying one of these tags are removed from kept blocks.
    pub strip_severities: SeveritySet,
    pub discard_empty_blocks: bool,
    /// Marker a line must start with to announce a finding.
    pub header_prefix: String,
    /// Treat `\` and `/` as the same character when matching paths.
    pub normalize_separators: bool,
}

impl Policy {
    /// Relevance-only policy: whole blocks, no severity handling.
    pub fn new(path_fragment: impl Into<String>) -> Self {
        Self {
            path_fragment: path_fragment.into(),
            require_source_extension: false,
            source_extensions: vec!["c".to_string()],
            drop_severities: SeveritySet::new(),
            strip_severities: SeveritySet::new(),
            discard_empty_blocks: false,
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
            normalize_separators: true,
        }
    }

    pub fn with_strip(mut self, tags: impl Into<SeveritySet>) -> Self {
        self.strip_severities = tags.into();
        self
    }

    pub fn with_drop(mut self, tags: impl Into<SeveritySet>) -> Self {
        self.drop_severities = tags.into();
        self
    }

    pub fn with_discard_empty_blocks(mut self, discard: bool) -> Self {
        self.discard_empty_blocks = discard;
        self
    }

    pub fn with_source_extension(mut self, require: bool) -> Self {
        self.require_source_extension = require;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.path_fragment.trim().is_empty() {
            return Err(PolicyError::EmptyPathFragment);
        }
        if self.header_prefix.trim().is_empty() {
            return Err(PolicyError::EmptyHeaderPrefix);
        }
        if self.require_source_extension && self.source_extensions.is_empty() {
            return Err(PolicyError::NoSourceExtensions);
        }
        for ext in &self.source_extensions {
            let bad = ext.is_empty()
                || ext.contains(|c: char| matches!(c, '.' | '/' | '\\') || c.is_whitespace());
            if bad {
                return Err(PolicyError::InvalidExtension(ext.clone()));
            }
        }
        Ok(())
    }

    /// A body line goes when any keyword on it is dropped or stripped.
    pub(crate) fn removes_body_line(&self, tags: &SeveritySet) -> bool {
        tags.intersects(&self.drop_severities) || tags.intersects(&self.strip_severities)
    }
}

/// The three stock filters shipped for MISRA reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Every finding in the tracked tree, bodies untouched.
    Advisory,
    /// Advisory lines stripped.
    Required,
    /// Advisory and required lines stripped, empty findings discarded.
    Mandatory,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Advisory, Preset::Required, Preset::Mandatory];

    pub fn policy(&self, path_fragment: impl Into<String>) -> Policy {
        let base = Policy::new(path_fragment);
        match self {
            Preset::Advisory => base.with_source_extension(true),
            Preset::Required => base
                .with_source_extension(true)
                .with_strip([SeverityTag::Advisory]),
            Preset::Mandatory => base
                .with_strip([SeverityTag::Advisory, SeverityTag::Required])
                .with_discard_empty_blocks(true),
        }
    }

    pub fn default_output(&self) -> &'static str {
        match self {
            Preset::Advisory => "lint_filtered.log",
            Preset::Required => "lint_filtered-required.log",
            Preset::Mandatory => "lint_filtered_only_mandatory.log",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Advisory => "advisory",
            Preset::Required => "required",
            Preset::Mandatory => "mandatory",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PolicyError::UnknownPreset(s.to_string()))
    }
}
