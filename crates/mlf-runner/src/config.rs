use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mlf_core::{Policy, Preset, SeveritySet, DEFAULT_HEADER_PREFIX, DEFAULT_PATH_FRAGMENT};

use crate::report::Encoding;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub report: ReportConfig,
    pub policy: PolicyConfig,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    pub input: String,
    #[serde(default)]
    pub encoding: Encoding,
}

/// Settings shared by every profile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub path_fragment: String,
    #[serde(default = "default_header_prefix")]
    pub header_prefix: String,
    #[serde(default = "default_true")]
    pub normalize_separators: bool,
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub output: String,
    #[serde(default)]
    pub require_source_extension: bool,
    #[serde(default)]
    pub drop_severities: SeveritySet,
    #[serde(default)]
    pub strip_severities: SeveritySet,
    #[serde(default)]
    pub discard_empty_blocks: bool,
}

fn default_header_prefix() -> String {
    DEFAULT_HEADER_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_source_extensions() -> Vec<String> {
    vec!["c".to_string()]
}

impl ProfileConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let p = preset.policy(DEFAULT_PATH_FRAGMENT);
        Self {
            output: preset.default_output().to_string(),
            require_source_extension: p.require_source_extension,
            drop_severities: p.drop_severities,
            strip_severities: p.strip_severities,
            discard_empty_blocks: p.discard_empty_blocks,
        }
    }
}

impl Config {
    pub fn default_for_repo() -> Self {
        let profiles = Preset::ALL
            .into_iter()
            .map(|p| (p.as_str().to_string(), ProfileConfig::from_preset(p)))
            .collect();
        Self {
            report: ReportConfig {
                input: "lint.log".to_string(),
                encoding: Encoding::Auto,
            },
            policy: PolicyConfig {
                path_fragment: DEFAULT_PATH_FRAGMENT.to_string(),
                header_prefix: default_header_prefix(),
                normalize_separators: true,
                source_extensions: default_source_extensions(),
            },
            profiles,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    /// Load `.mlf/mlf.toml` under `root`, or fall back to the built-in profiles.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = Self::config_path(root);
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default_for_repo())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".mlf").join("mlf.toml")
    }

    pub fn profile(&self, name: &str) -> Result<&ProfileConfig> {
        self.profiles.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
            anyhow!("unknown profile '{}' (known: {})", name, known.join(", "))
        })
    }

    /// Assemble the policy for a profile. Validation happens when it is used.
    pub fn policy_for(&self, name: &str) -> Result<Policy> {
        let profile = self.profile(name)?;
        Ok(Policy {
            path_fragment: self.policy.path_fragment.clone(),
            require_source_extension: profile.require_source_extension,
            source_extensions: self.policy.source_extensions.clone(),
            drop_severities: profile.drop_severities.clone(),
            strip_severities: profile.strip_severities.clone(),
            discard_empty_blocks: profile.discard_empty_blocks,
            header_prefix: self.policy.header_prefix.clone(),
            normalize_separators: self.policy.normalize_separators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlf_core::SeverityTag;

    #[test]
    fn default_has_stock_profiles() {
        let cfg = Config::default_for_repo();
        let names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["advisory", "mandatory", "required"]);
        assert_eq!(cfg.profile("required").unwrap().output, "lint_filtered-required.log");
        assert_eq!(cfg.policy_for("mandatory").unwrap(), Preset::Mandatory.policy(DEFAULT_PATH_FRAGMENT));
    }

    #[test]
    fn unknown_profile_is_error() {
        let err = Config::default_for_repo().policy_for("nope").unwrap_err();
        assert!(err.to_string().contains("unknown profile 'nope'"));
    }

    #[test]
    fn toml_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::config_path(dir.path());
        Config::default_for_repo().save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.policy.path_fragment, DEFAULT_PATH_FRAGMENT);
        assert_eq!(loaded.profiles.len(), 3);
    }

    #[test]
    fn parses_hand_written_config() {
        let s = r#"
[report]
input = "build/lint.log"
encoding = "utf-16le"

[policy]
path_fragment = "src/app/"

[profiles.strict]
output = "strict.log"
strip_severities = ["advisory", "required"]
discard_empty_blocks = true
"#;
        let cfg: Config = toml::from_str(s).unwrap();
        assert_eq!(cfg.report.encoding, Encoding::Utf16Le);
        assert_eq!(cfg.policy.header_prefix, "File ");
        assert!(cfg.policy.normalize_separators);
        let policy = cfg.policy_for("strict").unwrap();
        assert!(policy.strip_severities.contains(SeverityTag::Required));
        assert!(!policy.require_source_extension);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_severity_name() {
        let s = r#"
[report]
input = "lint.log"

[policy]
path_fragment = "src/"

[profiles.bad]
output = "bad.log"
strip_severities = ["critical"]
"#;
        assert!(toml::from_str::<Config>(s).is_err());
    }

    #[test]
    fn missing_config_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.report.input, "lint.log");
    }
}
