//! flatloc CLI
//!
//! Entry point for the `flatloc` command-line tool.

mod check;
mod logging;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use flatloc_core::config::DEFAULT_CONFIG_FILE;
use flatloc_core::{
    CollisionPolicy, DelimiterPolicy, FlatlocConfig, FlatlocConfigBuilder, LocalizationTable,
    OutputFormat, OutputOptions, generate, render_table, write_table,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

const EXIT_OK: u8 = 0;
const EXIT_DRIFT: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "flatloc")]
#[command(
    about = "Flatten nested JSON/YAML localization files into a single key/value table",
    version
)]
struct Cli {
    /// Directory to scan for .json, .yaml and .yml files
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory the table is written into (default: output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file name (default: localizations.<format>)
    #[arg(long)]
    file_name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// How keys containing '.' are encoded
    #[arg(long, value_enum)]
    delimiter_policy: Option<DelimiterArg>,

    /// Fail when two files define the same key
    #[arg(long)]
    strict: bool,

    /// Config file (default: .flatloc.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the table instead of writing it
    #[arg(long, conflicts_with = "check")]
    stdout: bool,

    /// Compare with the existing output file and exit 1 if it is out of date
    #[arg(long)]
    check: bool,

    /// Print a JSON summary instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DelimiterArg {
    Escape,
    Preserve,
    Reject,
}

impl From<DelimiterArg> for DelimiterPolicy {
    fn from(arg: DelimiterArg) -> Self {
        match arg {
            DelimiterArg::Escape => DelimiterPolicy::Escape,
            DelimiterArg::Preserve => DelimiterPolicy::Preserve,
            DelimiterArg::Reject => DelimiterPolicy::Reject,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let (config, input) = resolve_config(cli)?;
    debug!(?config, "resolved configuration");

    let table = generate(&input, &config)
        .with_context(|| format!("failed to flatten {}", input.display()))?;
    let options = OutputOptions::from(&config);

    if cli.stdout {
        print!("{}", render_table(&table, options.format)?);
        return Ok(EXIT_OK);
    }

    let output_dir = config.output_dir();
    if cli.check {
        let target = output_dir.join(&options.file_name);
        let rendered = render_table(&table, options.format)?;
        let drift = check::diff_against(&target, &rendered)?;
        if cli.json {
            print_json_summary(&table, &target, Some(drift.is_none()))?;
        } else {
            match &drift {
                Some(diff) => {
                    check::print_diff(diff);
                    eprintln!(
                        "{} {} is out of date",
                        "drift:".red().bold(),
                        target.display()
                    );
                }
                None => println!("{} {} is up to date", "ok:".green().bold(), target.display()),
            }
        }
        return Ok(if drift.is_none() { EXIT_OK } else { EXIT_DRIFT });
    }

    let written = write_table(&table, &output_dir, &options)?;
    if cli.json {
        print_json_summary(&table, &written, None)?;
    } else if !cli.quiet {
        print_summary(&table, &written);
    }
    Ok(EXIT_OK)
}

/// Merge config file values with command-line flags. Flags win.
fn resolve_config(cli: &Cli) -> anyhow::Result<(FlatlocConfig, PathBuf)> {
    let base = match &cli.config {
        Some(path) => FlatlocConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match FlatlocConfig::discover(Path::new(".")) {
            // A discovered file is held to the same standard as `-c`
            Some(path) => {
                debug!(path = %path.display(), "using {}", DEFAULT_CONFIG_FILE);
                FlatlocConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?
            }
            None => FlatlocConfig::default(),
        },
    };

    let input = cli
        .input
        .clone()
        .or_else(|| base.input.clone())
        .filter(|path| !is_blank(path));
    let Some(input) = input else {
        bail!("input directory not set (use --input or set `input` in {DEFAULT_CONFIG_FILE})");
    };

    let mut builder = FlatlocConfigBuilder::from(base);
    builder.input(input.clone());
    if let Some(output) = cli.output.as_ref().filter(|path| !is_blank(path)) {
        builder.output(output.clone());
    }
    if let Some(format) = cli.format {
        builder.format(format.into());
    }
    if let Some(name) = &cli.file_name {
        builder.file_name(name.clone());
    }
    if let Some(policy) = cli.delimiter_policy {
        builder.delimiter_policy(policy.into());
    }
    if cli.strict {
        builder.on_collision(CollisionPolicy::Error);
    }

    let mut config = builder.build().context("invalid configuration")?;
    // An empty `output` in the config file means the default too
    if config.output.as_deref().is_some_and(is_blank) {
        config.output = None;
    }
    Ok((config, input))
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

fn print_summary(table: &LocalizationTable, written: &Path) {
    println!(
        "{} {} keys from {} files to {}",
        "wrote".green().bold(),
        table.len(),
        table.sources().len(),
        written.display()
    );

    let overwrites = table
        .collisions()
        .iter()
        .filter(|c| !c.is_same_value())
        .count();
    if overwrites > 0 {
        println!(
            "{} {} keys overwritten by later files",
            "note:".yellow().bold(),
            overwrites
        );
    }
}

fn print_json_summary(
    table: &LocalizationTable,
    target: &Path,
    up_to_date: Option<bool>,
) -> anyhow::Result<()> {
    let mut summary = serde_json::json!({
        "output": target,
        "files": table.sources(),
        "keys": table.len(),
        "collisions": table.collisions(),
    });
    if let Some(up_to_date) = up_to_date {
        summary["up_to_date"] = serde_json::Value::Bool(up_to_date);
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("flatloc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("flatloc.toml");
        std::fs::write(
            &config_path,
            "input = \"from_config\"\noutput = \"out\"\nformat = \"yaml\"\n",
        )
        .unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = parse(&["-c", config_arg, "-i", "locales", "--strict"]);
        let (config, input) = resolve_config(&cli).unwrap();
        assert_eq!(input, PathBuf::from("locales"));
        assert_eq!(config.output_dir(), PathBuf::from("out"));
        assert_eq!(config.format, OutputFormat::Yaml);
        assert_eq!(config.on_collision, CollisionPolicy::Error);

        let cli = parse(&["-c", config_arg, "-f", "json", "-o", "elsewhere"]);
        let (config, input) = resolve_config(&cli).unwrap();
        assert_eq!(input, PathBuf::from("from_config"));
        assert_eq!(config.output_dir(), PathBuf::from("elsewhere"));
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_blank_output_uses_default() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("flatloc.toml");
        std::fs::write(&config_path, "").unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = parse(&["-c", config_arg, "-i", "mock", "-o", ""]);
        let (config, _) = resolve_config(&cli).unwrap();
        assert_eq!(config.output_dir(), PathBuf::from("output"));
    }

    #[test]
    fn test_blank_input_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("flatloc.toml");
        std::fs::write(&config_path, "").unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = parse(&["-c", config_arg, "-i", "  "]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(err.to_string().contains("input directory not set"));
    }

    #[test]
    fn test_stdout_conflicts_with_check() {
        let result =
            Cli::try_parse_from(["flatloc", "-i", "mock", "--stdout", "--check"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_value_enums_map_to_core() {
        assert_eq!(OutputFormat::from(FormatArg::Yaml), OutputFormat::Yaml);
        assert_eq!(
            DelimiterPolicy::from(DelimiterArg::Preserve),
            DelimiterPolicy::Preserve
        );
    }
}
