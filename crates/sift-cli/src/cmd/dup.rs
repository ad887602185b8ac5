//! `sift dup`: group near-identical documents by token-set Jaccard
//! similarity.
//!
//! The scan is quadratic in the number of documents it sees, so it runs on a
//! background job bounded by `duplicates.timeout_secs` (or `--timeout-secs`).
//! `--query` and the filter flags shrink the scanned set first.

use crate::cmd::{Context, FilterArgs};
use crate::output::{CliError, pretty_section, render_error, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sift_core::config::DuplicateConfig;
use sift_search::SearchEngine;
use std::io::{self, Write};

#[derive(Args, Debug)]
#[command(
    about = "Find near-duplicate documents",
    long_about = "Group documents whose normalized token sets overlap by at least the \
                  threshold (Jaccard similarity, default 0.95).",
    after_help = "EXAMPLES:\n    # Scan the whole corpus\n    sift dup\n\n\
                  # Only documents mentioning \"invoice\", looser threshold\n    sift dup --query invoice --threshold 0.9\n\n\
                  # Machine-readable output\n    sift dup --json"
)]
pub struct DupArgs {
    /// Only scan documents whose filename or text mentions this.
    #[arg(long, short)]
    pub query: Option<String>,

    /// Similarity threshold (0.0-1.0). Defaults to `duplicates.threshold`.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Abort the scan after this many seconds (0 disables).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Debug, Serialize)]
struct DupMember {
    filename: String,
    path: String,
}

#[derive(Debug, Serialize)]
struct DupOutput {
    threshold: f64,
    scanned: usize,
    count: usize,
    groups: Vec<Vec<DupMember>>,
}

pub fn run_dup(args: &DupArgs, ctx: &Context) -> Result<()> {
    let config = DuplicateConfig {
        threshold: args.threshold.unwrap_or(ctx.config.duplicates.threshold),
        timeout_secs: args.timeout_secs.unwrap_or(ctx.config.duplicates.timeout_secs),
        ..ctx.config.duplicates.clone()
    };
    if !(0.0..=1.0).contains(&config.threshold) {
        render_error(
            ctx.output,
            &CliError {
                message: format!("threshold {} is outside 0.0-1.0", config.threshold),
                suggestion: Some("pass a value such as --threshold 0.9".to_string()),
                error_code: None,
            },
        )?;
        anyhow::bail!("invalid threshold");
    }

    let corpus = ctx.corpus()?;
    let engine = SearchEngine::new(corpus, &ctx.config, None);
    let job = engine.duplicates(
        args.query.as_deref().unwrap_or_default(),
        &args.filters.to_filter(),
        &config,
    );

    let scan = match job.join() {
        Ok(scan) => scan,
        Err(err) => {
            render_error(ctx.output, &CliError::from_code(err.code(), err.to_string()))?;
            return Err(err.into());
        }
    };

    let groups: Vec<Vec<DupMember>> = scan
        .resolved()
        .into_iter()
        .map(|docs| {
            docs.into_iter()
                .map(|d| DupMember {
                    filename: d.filename.clone(),
                    path: d.path.clone(),
                })
                .collect()
        })
        .collect();

    let payload = DupOutput {
        threshold: config.threshold,
        scanned: scan.documents.len(),
        count: groups.len(),
        groups,
    };
    render_mode(ctx.output, &payload, write_text, write_pretty)
}

fn write_text(out: &DupOutput, w: &mut dyn Write) -> io::Result<()> {
    for (i, group) in out.groups.iter().enumerate() {
        for member in group {
            writeln!(w, "{}\t{}\t{}", i + 1, member.filename, member.path)?;
        }
    }
    Ok(())
}

fn write_pretty(out: &DupOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "{} duplicate group(s) among {} document(s) at threshold {:.2}",
            out.count, out.scanned, out.threshold
        ),
    )?;
    for (i, group) in out.groups.iter().enumerate() {
        writeln!(w, "Group {} ({} documents)", i + 1, group.len())?;
        for member in group {
            writeln!(w, "  {}  {}", member.filename, member.path)?;
        }
        writeln!(w)?;
    }
    Ok(())
}
