use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::normalize::CallShapes;

pub const CONFIG_FILE_NAME: &str = ".glotrc.json";

pub const TEST_FILE_PATTERNS: &[&str] = &[
    "**/spec/**",
    "**/test/**",
    "**/*_spec.rb",
    "**/*_test.rb",
];

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    #[serde(default = "default_source_root")]
    pub source_root: String,
    #[serde(default = "default_ignore_test_files")]
    pub ignore_test_files: bool,
    /// Method names recognized as translation calls in addition to
    /// `t`, `t!`, `translate` and `translate!`.
    #[serde(default)]
    pub translation_methods: Vec<String>,
    #[serde(default = "default_magic_comments")]
    pub magic_comments: bool,
}

fn default_includes() -> Vec<String> {
    ["app", "lib"].map(String::from).to_vec()
}

fn default_source_root() -> String {
    "./".to_string()
}

fn default_ignore_test_files() -> bool {
    true
}

fn default_magic_comments() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignores: Vec::new(),
            includes: default_includes(),
            source_root: default_source_root(),
            ignore_test_files: default_ignore_test_files(),
            translation_methods: Vec::new(),
            magic_comments: default_magic_comments(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob patterns in `ignores` or `includes` are invalid,
    /// or if a translation method name is blank.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        // Patterns without wildcards are literal directory paths.
        for pattern in &self.includes {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'includes': \"{}\"", pattern)
                })?;
            }
        }

        for name in &self.translation_methods {
            if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
                bail!("Invalid method name in 'translationMethods': \"{}\"", name);
            }
        }

        Ok(())
    }

    /// Call shapes for the normalizer: the built-in names plus `translationMethods`.
    pub fn call_shapes(&self) -> CallShapes {
        CallShapes::default().with_translation_methods(self.translation_methods.iter().cloned())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
