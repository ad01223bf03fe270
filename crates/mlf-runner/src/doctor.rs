use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::util::resolve_path;
use crate::Config;

/// Check that every profile yields a valid policy and that the report is readable.
pub fn doctor(root: &Path, cfg: &Config) -> Result<()> {
    if cfg.profiles.is_empty() {
        return Err(anyhow!("no profiles configured; run `mlf init` or add [profiles.<name>]"));
    }

    for name in cfg.profiles.keys() {
        let policy = cfg.policy_for(name)?;
        policy.validate().with_context(|| format!("profile {}", name))?;
    }

    // two profiles writing one file would overwrite each other
    let mut outputs = std::collections::HashMap::new();
    for (name, profile) in &cfg.profiles {
        let out = resolve_path(root, &profile.output);
        if let Some(other) = outputs.insert(out.clone(), name) {
            return Err(anyhow!(
                "profiles '{}' and '{}' both write {}",
                other,
                name,
                out.display()
            ));
        }
    }

    let input = resolve_path(root, &cfg.report.input);
    if !input.is_file() {
        return Err(anyhow!("report not found: {}", input.display()));
    }
    Ok(())
}
