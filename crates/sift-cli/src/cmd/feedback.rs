//! `sift good` / `sift bad`: record relevance feedback for a document.

use crate::cmd::Context;
use crate::output::{CliError, render, render_error};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sift_core::error::ErrorCode;
use sift_search::Relevance;

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    /// Filename of the document, as shown in search results.
    pub filename: String,
}

#[derive(Debug, Serialize)]
struct FeedbackOutput<'a> {
    filename: &'a str,
    relevance: Relevance,
    score: i64,
}

pub fn run_feedback(args: &FeedbackArgs, relevance: Relevance, ctx: &Context) -> Result<()> {
    let corpus = ctx.corpus()?;
    if corpus.find_by_filename(&args.filename).is_none() {
        render_error(
            ctx.output,
            &CliError::from_code(
                ErrorCode::DocumentNotFound,
                format!("no document named '{}'", args.filename),
            ),
        )?;
        anyhow::bail!("document not found: {}", args.filename);
    }

    let store = ctx.feedback()?;
    if let Err(err) = store.record(&args.filename, relevance) {
        render_error(
            ctx.output,
            &CliError::from_code(ErrorCode::FeedbackWriteFailed, format!("{err:#}")),
        )?;
        return Err(err);
    }

    let payload = FeedbackOutput {
        filename: &args.filename,
        relevance,
        score: store.score(&args.filename),
    };
    render(ctx.output, &payload, |p, w| {
        let verb = match p.relevance {
            Relevance::Good => "up",
            Relevance::Bad => "down",
        };
        writeln!(w, "✓ {} voted {verb} (feedback {:+})", p.filename, p.score)
    })
}
