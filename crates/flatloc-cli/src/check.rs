//! `--check` support: compare freshly rendered output with the file on disk.

use anyhow::Context;
use colored::Colorize;
use similar::TextDiff;
use std::io::ErrorKind;
use std::path::Path;

/// Unified diff from the file at `target` to `rendered`, or `None` when they
/// match. A missing target counts as empty.
pub fn diff_against(target: &Path, rendered: &str) -> anyhow::Result<Option<String>> {
    let existing = match std::fs::read_to_string(target) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", target.display()));
        }
    };

    if existing == rendered {
        return Ok(None);
    }

    let old_header = target.display().to_string();
    let diff = TextDiff::from_lines(existing.as_str(), rendered)
        .unified_diff()
        .context_radius(3)
        .header(&old_header, "generated")
        .to_string();
    Ok(Some(diff))
}

pub fn print_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("---") || line.starts_with("+++") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else {
            println!("{}", line);
        }
    }
}
