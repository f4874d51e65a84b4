// src/settings.rs
//! Persisted user settings: a single API key stored under `settings-storage`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const SETTINGS_STORAGE_KEY: &str = "settings-storage";
pub const ENV_SETTINGS_DIR: &str = "SETTINGS_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub openai_api_key: String,
}

impl Settings {
    /// The key, or `None` when blank.
    pub fn api_key(&self) -> Option<&str> {
        let k = self.openai_api_key.trim();
        (!k.is_empty()).then_some(k)
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    state: &'a Settings,
    version: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Wrapped { state: Settings },
    Plain(Settings),
}

/// File-backed settings holder. Reads are served from memory.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<Settings>,
}

impl SettingsStore {
    /// Open `<dir>/settings-storage.json`. A missing or unreadable file starts empty.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(format!("{SETTINGS_STORAGE_KEY}.json"));
        let current = match read_settings(&path) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = ?e, path = %path.display(), "starting with empty settings");
                Settings::default()
            }
        };
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    /// `$SETTINGS_DIR`, else the working directory.
    pub fn open_default() -> Self {
        let dir = std::env::var(ENV_SETTINGS_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self::open(&dir)
    }

    pub fn get(&self) -> Settings {
        self.current
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Store a new key. No format validation.
    pub fn set(&self, api_key: &str) -> Result<()> {
        let next = Settings {
            openai_api_key: api_key.to_string(),
        };
        write_settings(&self.path, &next)?;
        let mut g = self
            .current
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        *g = next;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let stored: Stored = serde_json::from_str(&s).context("parsing settings json")?;
    Ok(match stored {
        Stored::Wrapped { state } => state,
        Stored::Plain(s) => s,
    })
}

/// Write to a uniquely named sibling file, then rename it over `path`.
fn write_settings(path: &Path, value: &Settings) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let json = serde_json::to_string(&Envelope {
        state: value,
        version: 0,
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
