use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use mlf_core::{filter_with_stats, FilterStats};
use tracing::{debug, info};

use crate::report::{read_report_or_empty, split_lines, write_report, Encoding};
use crate::{
    doctor::doctor,
    util::{resolve_given, resolve_path},
    Config,
};

/// Per-invocation settings that take precedence over `mlf.toml`.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub path_fragment: Option<String>,
    pub encoding: Option<Encoding>,
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub profile: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_lines: usize,
    pub output_lines: usize,
    pub stats: FilterStats,
}

pub struct Runner {
    pub root: PathBuf,
    pub cfg: Config,
}

impl Runner {
    pub fn open(root: PathBuf) -> Result<Self> {
        let cfg = Config::load_or_default(&root)?;
        Ok(Self { root, cfg })
    }

    /// Open with an explicit config file instead of `.mlf/mlf.toml`.
    pub fn open_with_config(root: PathBuf, config: &Path) -> Result<Self> {
        let cfg = Config::load_from(config)?;
        Ok(Self { root, cfg })
    }

    /// Write the default `.mlf/mlf.toml` unless one exists. Returns its path.
    pub fn init_repo(root: &Path) -> Result<PathBuf> {
        let cfg_path = Config::config_path(root);
        if !cfg_path.exists() {
            Config::default_for_repo().save_to(&cfg_path)?;
        }
        Ok(cfg_path)
    }

    pub fn doctor(&self) -> Result<()> {
        doctor(&self.root, &self.cfg)
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.cfg.profiles.keys().map(String::as_str).collect()
    }

    pub fn run_profile(&self, name: &str, ov: &Overrides) -> Result<RunSummary> {
        let profile = self.cfg.profile(name)?;
        let mut policy = self.cfg.policy_for(name)?;
        if let Some(fragment) = &ov.path_fragment {
            policy.path_fragment = fragment.clone();
        }

        let input = match &ov.input {
            Some(p) => resolve_given(&self.root, p),
            None => resolve_path(&self.root, &self.cfg.report.input),
        };
        let output = match &ov.output {
            Some(p) => resolve_given(&self.root, p),
            None => resolve_path(&self.root, &profile.output),
        };
        let encoding = ov.encoding.unwrap_or(self.cfg.report.encoding);

        info!(profile = name, input = %input.display(), %encoding, "filtering report");

        let text = read_report_or_empty(&input, encoding)?;
        let lines = split_lines(&text);
        let outcome = filter_with_stats(&lines, &policy).with_context(|| format!("profile {}", name))?;

        debug!(profile = name, stats = ?outcome.stats, "scan finished");
        write_report(&output, &outcome.lines)?;

        info!(
            profile = name,
            output = %output.display(),
            kept_blocks = outcome.stats.blocks_kept,
            lines = outcome.lines.len(),
            "filtered report written"
        );

        Ok(RunSummary {
            profile: name.to_string(),
            input,
            output,
            input_lines: lines.len(),
            output_lines: outcome.lines.len(),
            stats: outcome.stats,
        })
    }

    /// Run every configured profile, in name order.
    pub fn run_all(&self, ov: &Overrides) -> Result<Vec<RunSummary>> {
        if ov.output.is_some() {
            bail!("an output override needs a single profile");
        }
        self.cfg
            .profiles
            .keys()
            .map(|name| self.run_profile(name, ov))
            .collect()
    }
}
