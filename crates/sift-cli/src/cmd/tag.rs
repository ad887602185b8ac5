//! `sift tag` and `sift tags`: replace a document's tags or list them all.

use crate::cmd::Context;
use crate::output::{CliError, pretty_section, render, render_error, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sift_core::error::ErrorCode;
use std::io::{self, Write};
use tracing::info;

#[derive(Args, Debug)]
#[command(
    about = "Replace a document's tags",
    after_help = "EXAMPLES:\n    # Tag a document\n    sift tag /home/me/docs/report.pdf work finance\n\n\
                  # Clear all tags\n    sift tag /home/me/docs/report.pdf"
)]
pub struct TagArgs {
    /// Document path as stored in the corpus.
    pub path: String,

    /// New tags; none clears the document's tags.
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TagOutput<'a> {
    path: &'a str,
    updated: usize,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TagList {
    count: usize,
    tags: Vec<String>,
}

pub fn run_tag(args: &TagArgs, ctx: &Context) -> Result<()> {
    let mut corpus = ctx.corpus()?;
    let updated = corpus.set_tags(&args.path, args.tags.iter().map(String::as_str));
    if updated == 0 {
        render_error(
            ctx.output,
            &CliError::from_code(
                ErrorCode::DocumentNotFound,
                format!("no document at '{}'", args.path),
            ),
        )?;
        anyhow::bail!("document not found: {}", args.path);
    }

    corpus.save_json(&ctx.corpus_path)?;
    info!(path = %args.path, updated, "tags replaced");

    let tags = corpus
        .find_by_path(&args.path)
        .map(|d| d.tags.iter().cloned().collect())
        .unwrap_or_default();

    let payload = TagOutput {
        path: &args.path,
        updated,
        tags,
    };
    render(ctx.output, &payload, |p, w| {
        if p.tags.is_empty() {
            writeln!(w, "✓ cleared tags on {}", p.path)
        } else {
            writeln!(w, "✓ {} tagged {}", p.path, p.tags.join(", "))
        }
    })
}

pub fn run_tags(ctx: &Context) -> Result<()> {
    let corpus = ctx.corpus()?;
    let tags = corpus.all_tags();
    let payload = TagList {
        count: tags.len(),
        tags,
    };
    render_mode(ctx.output, &payload, write_text, write_pretty)
}

fn write_text(list: &TagList, w: &mut dyn Write) -> io::Result<()> {
    for tag in &list.tags {
        writeln!(w, "{tag}")?;
    }
    Ok(())
}

fn write_pretty(list: &TagList, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Tags ({})", list.count))?;
    write_text(list, w)
}
