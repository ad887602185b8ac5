//! Rendering for every `sift` command.
//!
//! A command builds one serializable payload and hands it here with a text
//! and a pretty writer. The mode is picked in this order:
//!
//! - an explicit `--format`, then the hidden `--json` alias
//! - the `FORMAT` environment variable (case-insensitive; unknown values are
//!   ignored)
//! - pretty when stdout is a terminal, tab-separated text otherwise
//!
//! Errors always go to stderr, as `error[E####]: ...` lines or as a JSON
//! `{"error": {...}}` object.

use clap::ValueEnum;
use serde::Serialize;
use sift_core::error::ErrorCode;
use std::io::{self, IsTerminal, Write};

const RULE_WIDTH: usize = 72;

/// Heading line underlined with dashes.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))
}

/// Indented `key: value` line with the values aligned.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "  {:<10} {}", format!("{key}:"), value.as_ref())
}

/// First `max_chars` characters of `text` on one line, with an ellipsis when
/// cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut out: String = flat.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Headings, aligned fields and text snippets.
    Pretty,
    /// One tab-separated row per record.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

fn pick_output_mode(
    flag: Option<OutputMode>,
    json_alias: bool,
    env: Option<&str>,
    stdout_is_tty: bool,
) -> OutputMode {
    let from_env = || env.and_then(|v| <OutputMode as ValueEnum>::from_str(v.trim(), true).ok());
    flag.or_else(|| json_alias.then_some(OutputMode::Json))
        .or_else(from_env)
        .unwrap_or(if stdout_is_tty {
            OutputMode::Pretty
        } else {
            OutputMode::Text
        })
}

pub fn resolve_output_mode(flag: Option<OutputMode>, json_alias: bool) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    pick_output_mode(flag, json_alias, env.as_deref(), io::stdout().is_terminal())
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Write `value` to stdout as JSON, or through the writer for the human mode.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => write_json(&mut out, value)?,
        OutputMode::Text => text(value, &mut out)?,
        OutputMode::Pretty => pretty(value, &mut out)?,
    }
    Ok(())
}

/// [`render_mode`] for payloads that print the same in text and pretty mode.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl Fn(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    render_mode(mode, value, &human, &human)
}

/// A failure as reported to the user.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    /// What to try next.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Stable `E####` code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// `message` tagged with `code` and its standard hint.
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    write_error(&mut io::stderr().lock(), mode, error)
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode.is_json() {
        return write_json(out, &serde_json::json!({ "error": error }));
    }
    let code = error
        .error_code
        .as_deref()
        .map_or_else(String::new, |c| format!("[{c}]"));
    writeln!(out, "error{code}: {}", error.message)?;
    if let Some(hint) = &error.suggestion {
        writeln!(out, "  hint: {hint}")?;
    }
    Ok(())
}
