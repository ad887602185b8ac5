//! `sift search`: fused ranking over the filtered corpus.

use crate::cmd::{Context, FilterArgs};
use crate::output::{CliError, pretty_kv, pretty_section, render_error, render_mode, snippet};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sift_core::error::ErrorCode;
use sift_search::{FusedResult, RecentSearchCache, SearchEngine};
use std::io::{self, Write};
use tracing::debug;

#[derive(Args, Debug)]
#[command(
    about = "Search the corpus",
    long_about = "Rank documents by exact, fuzzy, TF-IDF and semantic similarity to the query.\n\n\
                  Filename matches outrank text matches; feedback from `sift good` / `sift bad` \
                  nudges the final order.",
    after_help = "EXAMPLES:\n    # Search everything\n    sift search \"quarterly report\"\n\n\
                  # Only PDFs modified this week\n    sift search invoice --ext .pdf --since 7d\n\n\
                  # Reuse the cached answer for a recent query\n    sift search invoice --cached"
)]
pub struct SearchArgs {
    /// Query text.
    pub query: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Serve the recent-search snapshot for this exact query when present.
    #[arg(long)]
    pub cached: bool,
}

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    cached: bool,
    count: usize,
    results: &'a [FusedResult],
}

pub fn run_search(args: &SearchArgs, ctx: &Context) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        render_error(
            ctx.output,
            &CliError::from_code(ErrorCode::EmptyQuery, "query is empty"),
        )?;
        anyhow::bail!("empty query");
    }

    let recent = RecentSearchCache::open(&ctx.paths, ctx.config.recent.clone());
    if args.cached {
        let snapshot = recent.lookup(query);
        if !snapshot.is_empty() {
            debug!(query, "serving cached results");
            return render_results(ctx, query, true, &snapshot);
        }
    }

    let corpus = ctx.corpus()?;
    let feedback = ctx.feedback()?;
    let engine = SearchEngine::new(corpus, &ctx.config, ctx.provider());
    let results = engine.search(query, &args.filters.to_filter(), Some(&feedback));

    recent.insert(query, &results);
    render_results(ctx, query, false, &results)
}

/// Render a ranked list, marking snapshots served from the recent cache.
pub fn render_results(
    ctx: &Context,
    query: &str,
    cached: bool,
    results: &[FusedResult],
) -> Result<()> {
    let payload = SearchOutput {
        query,
        cached,
        count: results.len(),
        results,
    };
    render_mode(ctx.output, &payload, write_text, write_pretty)
}

fn write_text(out: &SearchOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    for r in out.results {
        writeln!(
            w,
            "{:.2}\t{}\t{}\t{}",
            r.score,
            r.match_info.as_str(),
            r.filename,
            r.path
        )?;
    }
    Ok(())
}

fn write_pretty(out: &SearchOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    let heading = if out.cached {
        format!("Results for \"{}\" (cached)", out.query)
    } else {
        format!("Results for \"{}\"", out.query)
    };
    pretty_section(w, &heading)?;
    if out.results.is_empty() {
        writeln!(w, "No matches.")?;
        return Ok(());
    }

    for (rank, r) in out.results.iter().enumerate() {
        writeln!(w, "{:>2}. {}  [{:.1}]", rank + 1, r.filename, r.score)?;
        pretty_kv(w, "match", r.match_info.to_string())?;
        pretty_kv(w, "path", &r.path)?;
        pretty_kv(
            w,
            "signals",
            format!(
                "fuzzy {:.1}  tfidf {:.3}  embed {:.3}",
                r.per_signal_scores.fuzzy, r.per_signal_scores.tfidf, r.per_signal_scores.embed
            ),
        )?;
        if !r.tags.is_empty() {
            pretty_kv(w, "tags", r.tags.iter().cloned().collect::<Vec<_>>().join(", "))?;
        }
        pretty_kv(w, "text", snippet(&r.text, 80))?;
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_search::MatchInfo;
    use sift_search::fusion::SignalScores;
    use std::collections::BTreeSet;

    fn result() -> FusedResult {
        FusedResult {
            filename: "report.txt".to_string(),
            path: "/docs/report.txt".to_string(),
            text: "quarterly revenue report".to_string(),
            base_score: 220.0,
            boost: 1000.0,
            score: 1220.0,
            match_info: MatchInfo::ExactFilename,
            per_signal_scores: SignalScores::default(),
            tags: BTreeSet::from(["work".to_string()]),
        }
    }

    #[test]
    fn text_rows_are_tab_separated() {
        let results = [result()];
        let out = SearchOutput {
            query: "report",
            cached: false,
            count: 1,
            results: &results,
        };
        let mut buf = Vec::new();
        write_text(&out, &mut buf).expect("write");
        let line = String::from_utf8(buf).expect("utf8");
        assert_eq!(line, "1220.00\texact_filename\treport.txt\t/docs/report.txt\n");
    }

    #[test]
    fn pretty_output_shows_match_and_tags() {
        let results = [result()];
        let out = SearchOutput {
            query: "report",
            cached: true,
            count: 1,
            results: &results,
        };
        let mut buf = Vec::new();
        write_pretty(&out, &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("(cached)"));
        assert!(text.contains("Exact filename"));
        assert!(text.contains("work"));
    }
}
