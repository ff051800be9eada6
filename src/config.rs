use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    /// Data file, directory or glob
    #[serde(default)]
    pub(crate) data: Option<String>,
    #[serde(default)]
    pub(crate) locale: Option<String>,
    #[serde(default)]
    pub(crate) color: Option<ConfigColorMode>,
    #[serde(default)]
    pub(crate) no_color: bool,
    #[serde(default)]
    pub(crate) debug: bool,
    #[serde(default)]
    pub(crate) top_shared: Option<usize>,
    /// Preferred ordering of broadcaster names in shared-client listings
    #[serde(default)]
    pub(crate) broadcaster_order: Vec<String>,
    #[serde(default)]
    pub(crate) fallback_year: Option<i32>,
    #[serde(default)]
    pub(crate) export_dir: Option<PathBuf>,

    /// File the values were read from
    #[serde(skip)]
    pub(crate) source: Option<PathBuf>,
}

impl Config {
    pub(crate) fn load() -> Self {
        Self::load_from(&Self::get_config_paths())
    }

    pub(crate) fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Config>(content)
    }

    /// First readable and parseable file wins; broken files are skipped with a warning
    fn load_from(paths: &[PathBuf]) -> Self {
        for path in paths {
            if path.exists()
                && let Ok(content) = fs::read_to_string(path)
            {
                match Self::parse(&content) {
                    Ok(mut config) => {
                        config.source = Some(path.clone());
                        return config;
                    }
                    Err(e) => {
                        eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::default()
    }

    pub(crate) fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/adrev/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("adrev").join("config.toml"));
        }

        // 2. Platform config dir (e.g. ~/Library/Application Support/adrev/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("adrev").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.adrev.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".adrev.toml"));
        }

        paths
    }
}
