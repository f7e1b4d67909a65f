//! Placeholder resolution for file names, front matter and comment titles
//!
//! A template is plain text with `{...}` spans. Each span holds alternatives
//! separated by `??`; an alternative is a dotted field path, optionally
//! followed by `|` and a format spec:
//!
//! ```text
//! {number}-{title|cut:40}
//! {closed_at|yyyy-MM-dd??updated_at??created_at}
//! {milestone.title|uppercase??state}
//! ```
//!
//! The first alternative producing non-empty text wins. Nothing here fails:
//! missing fields, falsy values and unknown formatters all degrade to the
//! next alternative or the empty string.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

use crate::config::RenderConfig;
use crate::constants::{ALTERNATIVE_SEPARATOR, ARGUMENT_SEPARATOR, FORMAT_SEPARATOR};
use crate::datetime;
use crate::record::{Record, Value};
use crate::{IssueMdError, Result};

/// Single-level spans; the first `}` closes, spans never cross lines.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}\n]+)\}").expect("placeholder pattern is valid"));

/// String transforms a format spec may name
#[derive(Debug, Clone, PartialEq)]
pub enum Formatter {
    /// `cut:n` / `maxlength:n`, keep the first n characters
    Cut(usize),
    Uppercase,
    Lowercase,
    Trim,
    TrimStart,
    TrimEnd,
    /// `substring:start[:end]`, character offsets, swapped when reversed
    Substring(usize, Option<usize>),
    /// `replace:from:to`, every occurrence
    Replace(String, String),
}

impl Formatter {
    pub fn parse(name: &str, args: &[&str]) -> Result<Self> {
        let arg = |i: usize| args.get(i).copied().unwrap_or_default();

        let formatter = match name.trim() {
            "cut" | "maxlength" => Formatter::Cut(index_arg(arg(0))),
            "upper" | "uppercase" | "toUpperCase" => Formatter::Uppercase,
            "lower" | "lowercase" | "toLowerCase" => Formatter::Lowercase,
            "trim" => Formatter::Trim,
            "trimStart" => Formatter::TrimStart,
            "trimEnd" => Formatter::TrimEnd,
            "substring" => Formatter::Substring(
                index_arg(arg(0)),
                args.get(1).map(|end| index_arg(end)),
            ),
            "replace" => Formatter::Replace(arg(0).to_string(), arg(1).to_string()),
            other => return Err(IssueMdError::UnknownFormatter(other.to_string())),
        };

        Ok(formatter)
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Formatter::Cut(len) => text.chars().take(*len).collect(),
            Formatter::Uppercase => text.to_uppercase(),
            Formatter::Lowercase => text.to_lowercase(),
            Formatter::Trim => text.trim().to_string(),
            Formatter::TrimStart => text.trim_start().to_string(),
            Formatter::TrimEnd => text.trim_end().to_string(),
            Formatter::Substring(start, end) => {
                let count = text.chars().count();
                let start = (*start).min(count);
                let end = end.unwrap_or(count).min(count);
                let (from, to) = if start <= end { (start, end) } else { (end, start) };
                text.chars().skip(from).take(to - from).collect()
            }
            Formatter::Replace(from, _) if from.is_empty() => text.to_string(),
            Formatter::Replace(from, to) => text.replace(from.as_str(), to),
        }
    }
}

/// Leading integer of an argument; negatives and garbage clamp to 0,
/// values too large for `usize` saturate.
fn index_arg(arg: &str) -> usize {
    let arg = arg.trim();
    if arg.starts_with('-') {
        return 0;
    }

    let digits = arg.find(|c: char| !c.is_ascii_digit()).map_or(arg, |end| &arg[..end]);
    if digits.is_empty() {
        return 0;
    }

    digits.parse::<usize>().unwrap_or(usize::MAX)
}

/// Resolve every placeholder in `template` against `record`.
pub fn resolve(template: &str, record: &impl Record, config: &RenderConfig) -> String {
    resolve_value(template, &record.to_value(), config)
}

/// Same as [`resolve`] for callers that already hold the value tree.
pub fn resolve_value(template: &str, value: &Value, config: &RenderConfig) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| resolve_span(&caps[1], value, config))
        .into_owned()
}

fn resolve_span(span: &str, value: &Value, config: &RenderConfig) -> String {
    span.split(ALTERNATIVE_SEPARATOR)
        .find_map(|alternative| resolve_alternative(alternative, value, config))
        .unwrap_or_default()
}

fn resolve_alternative(alternative: &str, value: &Value, config: &RenderConfig) -> Option<String> {
    let (path, spec) = match alternative.split_once(FORMAT_SEPARATOR) {
        Some((path, spec)) => (path, Some(spec).filter(|s| !s.trim().is_empty())),
        None => (alternative, None),
    };

    let found = value.lookup(path).filter(|v| v.is_truthy())?;

    let text = match (found, spec) {
        // The whole spec is the pattern so `HH:mm` keeps its colon
        (Value::Timestamp(ts), spec) => {
            datetime::format(ts, Some(spec.unwrap_or(config.date_format.as_str())))
        }
        (Value::Text(text), Some(spec)) => apply_format_spec(text, spec),
        (other, _) => other.to_text(),
    };

    Some(text).filter(|t| !t.is_empty())
}

fn apply_format_spec(text: &str, spec: &str) -> String {
    let mut parts = spec.split(ARGUMENT_SEPARATOR);
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match Formatter::parse(name, &args) {
        Ok(formatter) => formatter.apply(text),
        Err(err) => {
            warn!("{}; leaving value unformatted", err);
            text.to_string()
        }
    }
}

/// Report the first formatter name outside the supported set.
///
/// Field types are not known up front, so a spec containing date tokens is
/// assumed to be a date pattern and skipped.
pub fn validate_template(template: &str) -> Result<()> {
    for caps in PLACEHOLDER.captures_iter(template) {
        for alternative in caps[1].split(ALTERNATIVE_SEPARATOR) {
            let Some((_, spec)) = alternative.split_once(FORMAT_SEPARATOR) else {
                continue;
            };
            if spec.trim().is_empty() || looks_like_date_pattern(spec) {
                continue;
            }
            let mut parts = spec.split(ARGUMENT_SEPARATOR);
            let name = parts.next().unwrap_or_default();
            let args: Vec<&str> = parts.collect();
            Formatter::parse(name, &args)?;
        }
    }
    Ok(())
}

fn looks_like_date_pattern(spec: &str) -> bool {
    const TOKENS: [&str; 10] = ["yy", "MM", "dd", "DD", "HH", "hh", "mm", "ss", "tt", "H"];
    TOKENS.iter().any(|t| spec.contains(t))
}
