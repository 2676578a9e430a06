//! flatloc configuration
//!
//! Loaded from `.flatloc.toml`; every field is optional. Command-line flags
//! take precedence over file values, which take precedence over defaults.
//!
//! ```toml
//! input = "locales"
//! output = "build/i18n"
//! format = "yaml"
//! delimiter_policy = "escape"
//! on_collision = "error"
//! exclude = ["drafts/", "**/*.schema.json"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::file_utils::DEFAULT_MAX_FILE_SIZE;
use crate::flatten::DelimiterPolicy;
use crate::output::OutputFormat;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = ".flatloc.toml";

/// Output directory used when neither flags nor config name one.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Maximum number of exclude patterns accepted.
const MAX_EXCLUDE_PATTERNS: usize = 100;

/// What the merge step does when a later file writes a key that an earlier
/// file already wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep the later value and record the collision.
    #[default]
    Overwrite,
    /// Abort the build on the first collision.
    Error,
}

/// Errors that make a [`FlatlocConfig`] unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid exclude pattern '{pattern}': {error}")]
    InvalidGlobPattern { pattern: String, error: String },

    #[error("too many exclude patterns: {count} (limit {limit})")]
    TooManyPatterns { count: usize, limit: usize },

    #[error("invalid output file name '{name}': {reason}")]
    InvalidFileName { name: String, reason: &'static str },

    #[error("max_file_size must be greater than zero")]
    ZeroFileSizeLimit,

    #[error("max_files must be greater than zero")]
    ZeroFileLimit,
}

/// Build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlatlocConfig {
    /// Root directory to scan for source files
    pub input: Option<PathBuf>,

    /// Directory the merged table is written into
    pub output: Option<PathBuf>,

    /// Output file name; defaults to `localizations.<ext>` for the format
    pub file_name: Option<String>,

    /// Output serialization format
    pub format: OutputFormat,

    /// Handling of segments that contain the key delimiter
    pub delimiter_policy: DelimiterPolicy,

    /// Handling of keys written by more than one file
    pub on_collision: CollisionPolicy,

    /// Elide a top-level key equal to the file's own name
    pub collapse_stem_wrapper: bool,

    /// Glob patterns (relative to the input root) to skip during discovery.
    /// A trailing `/` excludes a whole directory.
    pub exclude: Vec<String>,

    /// Upper bound on the number of source files; `None` means unlimited
    pub max_files: Option<usize>,

    /// Per-file size limit in bytes
    pub max_file_size: u64,
}

impl Default for FlatlocConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            file_name: None,
            format: OutputFormat::default(),
            delimiter_policy: DelimiterPolicy::default(),
            on_collision: CollisionPolicy::default(),
            collapse_stem_wrapper: true,
            exclude: Vec::new(),
            max_files: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl FlatlocConfig {
    /// Create a new [`FlatlocConfigBuilder`].
    pub fn builder() -> FlatlocConfigBuilder {
        FlatlocConfigBuilder::default()
    }

    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the default config file in `dir`, if present.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    }

    /// Check field values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exclude.len() > MAX_EXCLUDE_PATTERNS {
            return Err(ConfigError::TooManyPatterns {
                count: self.exclude.len(),
                limit: MAX_EXCLUDE_PATTERNS,
            });
        }
        for pattern in &self.exclude {
            let normalized = pattern.replace('\\', "/");
            let glob_str = match normalized.strip_suffix('/') {
                Some(prefix) => format!("{}/**", prefix),
                None => normalized,
            };
            if let Err(e) = glob::Pattern::new(&glob_str) {
                return Err(ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    error: e.to_string(),
                });
            }
        }

        if let Some(name) = &self.file_name {
            validate_file_name(name)?;
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::ZeroFileSizeLimit);
        }
        if self.max_files == Some(0) {
            return Err(ConfigError::ZeroFileLimit);
        }
        Ok(())
    }

    /// Output file name, falling back to the format default.
    pub fn output_file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| self.format.default_file_name().to_string())
    }

    /// Output directory, falling back to [`DEFAULT_OUTPUT_DIR`].
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

fn validate_file_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.contains(|c: char| c == '/' || c == '\\') {
        Some("name must not contain path separators")
    } else if name == "." || name == ".." {
        Some("name must not be a relative directory")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidFileName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Builder for a validated [`FlatlocConfig`].
///
/// Setters return `&mut Self` for chaining; `build()` drains the builder, so a
/// second call starts from defaults again.
///
/// # Examples
///
/// ```rust
/// use flatloc_core::config::{CollisionPolicy, FlatlocConfig};
///
/// let config = FlatlocConfig::builder()
///     .on_collision(CollisionPolicy::Error)
///     .exclude(vec!["drafts/".to_string()])
///     .build()
///     .expect("valid config");
/// assert_eq!(config.on_collision, CollisionPolicy::Error);
/// ```
#[derive(Debug, Default)]
pub struct FlatlocConfigBuilder {
    config: FlatlocConfig,
}

impl FlatlocConfigBuilder {
    pub fn input(&mut self, input: impl Into<PathBuf>) -> &mut Self {
        self.config.input = Some(input.into());
        self
    }

    pub fn output(&mut self, output: impl Into<PathBuf>) -> &mut Self {
        self.config.output = Some(output.into());
        self
    }

    pub fn file_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.file_name = Some(name.into());
        self
    }

    pub fn format(&mut self, format: OutputFormat) -> &mut Self {
        self.config.format = format;
        self
    }

    pub fn delimiter_policy(&mut self, policy: DelimiterPolicy) -> &mut Self {
        self.config.delimiter_policy = policy;
        self
    }

    pub fn on_collision(&mut self, policy: CollisionPolicy) -> &mut Self {
        self.config.on_collision = policy;
        self
    }

    pub fn collapse_stem_wrapper(&mut self, collapse: bool) -> &mut Self {
        self.config.collapse_stem_wrapper = collapse;
        self
    }

    /// Append exclude patterns, skipping ones already present.
    pub fn exclude(&mut self, patterns: Vec<String>) -> &mut Self {
        for pattern in patterns {
            if !self.config.exclude.contains(&pattern) {
                self.config.exclude.push(pattern);
            }
        }
        self
    }

    pub fn max_files(&mut self, limit: Option<usize>) -> &mut Self {
        self.config.max_files = limit;
        self
    }

    pub fn max_file_size(&mut self, bytes: u64) -> &mut Self {
        self.config.max_file_size = bytes;
        self
    }

    /// Validate and return the config.
    pub fn build(&mut self) -> Result<FlatlocConfig, ConfigError> {
        let config = std::mem::take(&mut self.config);
        config.validate()?;
        Ok(config)
    }
}

impl From<FlatlocConfig> for FlatlocConfigBuilder {
    fn from(config: FlatlocConfig) -> Self {
        Self { config }
    }
}
