//! Serialization of the merged table to its output artifact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::FlatlocConfig;
use crate::diagnostics::{CoreError, CoreResult};
use crate::pipeline::LocalizationTable;

/// Serialization format of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn default_file_name(self) -> &'static str {
        match self {
            OutputFormat::Json => "localizations.json",
            OutputFormat::Yaml => "localizations.yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

/// Where and how the table is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub file_name: String,
}

impl OutputOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            file_name: format.default_file_name().to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

impl From<&FlatlocConfig> for OutputOptions {
    fn from(config: &FlatlocConfig) -> Self {
        Self {
            format: config.format,
            file_name: config.output_file_name(),
        }
    }
}

/// Render the table entries, sorted by key.
///
/// JSON output is pretty-printed and newline-terminated.
pub fn render_table(table: &LocalizationTable, format: OutputFormat) -> CoreResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(table.entries())
            .map(|mut rendered| {
                rendered.push('\n');
                rendered
            })
            .map_err(|e| CoreError::Render {
                message: e.to_string(),
            }),
        OutputFormat::Yaml => serde_yaml::to_string(table.entries()).map_err(|e| CoreError::Render {
            message: e.to_string(),
        }),
    }
}

/// Write the table to `output_dir/<file_name>`, creating the directory if
/// needed. Returns the path of the written file.
pub fn write_table(
    table: &LocalizationTable,
    output_dir: &Path,
    options: &OutputOptions,
) -> CoreResult<PathBuf> {
    if output_dir.as_os_str().is_empty() {
        return Err(CoreError::FileWrite {
            path: output_dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "output directory path is empty"),
        });
    }

    let rendered = render_table(table, options.format)?;

    fs::create_dir_all(output_dir).map_err(|source| CoreError::FileWrite {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = output_dir.join(&options.file_name);
    fs::write(&path, rendered).map_err(|source| CoreError::FileWrite {
        path: path.clone(),
        source,
    })?;

    info!(
        path = %path.display(),
        keys = table.len(),
        format = %options.format,
        "wrote localization table"
    );
    Ok(path)
}
