// src/config/sources.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sources::{SourceDescriptor, SourceRegistry};

pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";
pub const DEFAULT_SOURCES_CONFIG_PATH: &str = "config/sources.toml";

/// Both registries the service searches.
#[derive(Debug, Clone)]
pub struct Registries {
    pub opportunities: SourceRegistry,
    pub directories: SourceRegistry,
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            opportunities: SourceRegistry::default_opportunity_sources(),
            directories: SourceRegistry::default_company_directories(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    sources: Vec<SourceDescriptor>,
    #[serde(default)]
    directories: Vec<SourceDescriptor>,
}

/// Load registries from TOML. An empty table keeps the built-in list for that registry.
pub fn load_registries_from(path: &Path) -> Result<Registries> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    parse_registries(&content)
}

/// Load registries using env var + fallbacks:
/// 1) $SOURCES_CONFIG_PATH
/// 2) config/sources.toml
/// 3) built-in lists
pub fn load_registries_default() -> Result<Registries> {
    if let Ok(p) = std::env::var(ENV_SOURCES_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_registries_from(&pb);
        } else {
            return Err(anyhow!("SOURCES_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_SOURCES_CONFIG_PATH);
    if toml_p.exists() {
        return load_registries_from(&toml_p);
    }
    Ok(Registries::default())
}

fn parse_registries(s: &str) -> Result<Registries> {
    let file: SourcesFile = toml::from_str(s).context("parsing sources toml")?;
    let defaults = Registries::default();
    Ok(Registries {
        opportunities: clean_registry(file.sources).unwrap_or(defaults.opportunities),
        directories: clean_registry(file.directories).unwrap_or(defaults.directories),
    })
}

/// Drop entries without a name or base URL and later duplicates of a name.
fn clean_registry(items: Vec<SourceDescriptor>) -> Option<SourceRegistry> {
    let mut seen = std::collections::HashSet::new();
    let kept: Vec<SourceDescriptor> = items
        .into_iter()
        .filter(|s| !s.name.trim().is_empty() && !s.base_url.trim().is_empty())
        .filter(|s| seen.insert(s.name.trim().to_ascii_lowercase()))
        .map(|mut s| {
            s.feed_url = s.feed_url.filter(|f| !f.trim().is_empty());
            s
        })
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(SourceRegistry::new(kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn toml_overrides_and_cleans() {
        let toml = r#"
[[sources]]
name = "Board"
base_url = "https://board.test"
search_path = "/s?q="
feed_url = "https://board.test/rss?q="

[[sources]]
name = "board"
base_url = "https://dup.test"
search_path = "/"

[[sources]]
name = ""
base_url = "https://nameless.test"
search_path = "/"

[[sources]]
name = "Links"
base_url = "https://links.test"
search_path = "/find?q="
feed_url = " "
"#;
        let regs = parse_registries(toml).unwrap();
        let names: Vec<_> = regs
            .opportunities
            .sources()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Board", "Links"]);
        assert!(regs.opportunities.sources()[1].feed_url.is_none());
        // no [[directories]] → built-in list
        assert_eq!(regs.directories.len(), 4);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_SOURCES_CONFIG_PATH);

        let regs = load_registries_default().unwrap();
        assert_eq!(regs.opportunities.len(), 7);

        let p = tmp.path().join("custom.toml");
        fs::write(
            &p,
            "[[directories]]\nname = \"Dir\"\nbase_url = \"https://dir.test\"\nsearch_path = \"/?q=\"\n",
        )
        .unwrap();
        env::set_var(ENV_SOURCES_CONFIG_PATH, p.display().to_string());
        let regs = load_registries_default().unwrap();
        assert_eq!(regs.directories.len(), 1);
        assert_eq!(regs.opportunities.len(), 7);

        env::set_var(ENV_SOURCES_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(load_registries_default().is_err());
        env::remove_var(ENV_SOURCES_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
