//! Reading URL and name lists, parsing `-H` header arguments.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::BatchInput;

/// Non-empty lines of `text`, trimmed, skipping `#` comments.
pub(crate) fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_lines(&text))
}

/// Locators plus optional explicit destinations from the CLI input files.
pub(crate) fn load_batch_input(input: &BatchInput) -> Result<(Vec<String>, Option<Vec<PathBuf>>)> {
    let locators = read_lines(&input.input)?;
    let names = match &input.names {
        Some(path) => {
            let names: Vec<PathBuf> = read_lines(path)?.into_iter().map(PathBuf::from).collect();
            if names.len() != locators.len() {
                bail!(
                    "{} has {} names but {} has {} URLs",
                    path.display(),
                    names.len(),
                    input.input.display(),
                    locators.len()
                );
            }
            Some(names)
        }
        None => None,
    };
    Ok((locators, names))
}

/// Parse `Name: value` into a (name, value) pair.
pub(crate) fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("header {:?} is not in `Name: value` form", raw);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header {:?} has an empty name", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Config headers overlaid with command-line ones (command line wins).
pub(crate) fn merge_headers(
    base: &BTreeMap<String, String>,
    extra: &[String],
) -> Result<BTreeMap<String, String>> {
    let mut headers = base.clone();
    for raw in extra {
        let (name, value) = parse_header(raw)?;
        headers.insert(name, value);
    }
    Ok(headers)
}
