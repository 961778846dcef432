use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// [display] section configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Columns a leading tab expands to in rendered content
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,
}

/// [tools] section configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_git")]
    pub git: String,
    #[serde(default = "default_svn")]
    pub svn: String,
}

fn default_tab_width() -> usize {
    crate::text::DEFAULT_TAB_WIDTH
}

fn default_git() -> String {
    "git".into()
}

fn default_svn() -> String {
    "svn".into()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tab_width: default_tab_width(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: default_git(),
            svn: default_svn(),
        }
    }
}

/// Load config by merging global defaults with per-repo overrides.
/// Priority: per-repo `.vcs-ann.toml` > global `~/.config/vcs-ann/config.toml` > built-in defaults.
/// Merging is deep: individual fields within sections override independently.
pub fn load_config(repo_root: &Path) -> AnnConfig {
    let global_path = dirs::config_dir().map(|d| d.join("vcs-ann/config.toml"));
    load_config_from(global_path, repo_root.join(".vcs-ann.toml"))
}

pub fn load_config_from(global_path: Option<PathBuf>, local_path: PathBuf) -> AnnConfig {
    let global_table = global_path.and_then(|p| read_table(&p));
    let local_table = read_table(&local_path);

    let merged = match (global_table, local_table) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            toml::Value::Table(global)
        }
        (Some(global), None) => toml::Value::Table(global),
        (None, Some(local)) => toml::Value::Table(local),
        (None, None) => return AnnConfig::default(),
    };

    merged.try_into().unwrap_or_else(|e| {
        log::warn!("ignoring invalid configuration: {e}");
        AnnConfig::default()
    })
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<toml::Table>(&content) {
        Ok(t) => {
            log::debug!("loaded config from {}", path.display());
            Some(t)
        }
        Err(e) => {
            log::warn!("skipping {}: {e}", path.display());
            None
        }
    }
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(
    base: &mut toml::map::Map<String, toml::Value>,
    overlay: toml::map::Map<String, toml::Value>,
) {
    for (key, value) in overlay {
        match (base.get_mut(&key), &value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table.clone());
            }
            _ => {
                base.insert(key, value);
            }
        }
    }
}
