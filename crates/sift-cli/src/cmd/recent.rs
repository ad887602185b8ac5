//! `sift recent`: list recent queries or show one query's cached results.

use crate::cmd::Context;
use crate::output::{pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sift_search::RecentSearchCache;
use sift_search::recent::RecentEntry;
use std::io::{self, Write};

#[derive(Args, Debug)]
#[command(
    about = "Show recent searches",
    after_help = "EXAMPLES:\n    # Newest queries first\n    sift recent\n\n\
                  # Cached results of one query\n    sift recent \"quarterly report\""
)]
pub struct RecentArgs {
    /// Show the cached results of this exact query instead of the list.
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecentList {
    count: usize,
    recent: Vec<RecentEntry>,
}

pub fn run_recent(args: &RecentArgs, ctx: &Context) -> Result<()> {
    let cache = RecentSearchCache::open(&ctx.paths, ctx.config.recent.clone());

    if let Some(query) = &args.query {
        let snapshot = cache.lookup(query);
        return crate::cmd::search::render_results(ctx, query.trim(), true, &snapshot);
    }

    let recent = cache.queries();
    let payload = RecentList {
        count: recent.len(),
        recent,
    };
    render_mode(ctx.output, &payload, write_text, write_pretty)
}

fn write_text(list: &RecentList, w: &mut dyn Write) -> io::Result<()> {
    for entry in &list.recent {
        writeln!(w, "{}\t{}", entry.time.to_rfc3339(), entry.query)?;
    }
    Ok(())
}

fn write_pretty(list: &RecentList, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Recent searches")?;
    if list.recent.is_empty() {
        writeln!(w, "No recent searches.")?;
    }
    for entry in &list.recent {
        let local = entry.time.with_timezone(&chrono::Local);
        writeln!(w, "  {}  {}", local.format("%Y-%m-%d %H:%M"), entry.query)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn text_lists_newest_first_as_given() {
        let list = RecentList {
            count: 2,
            recent: vec![
                RecentEntry {
                    query: "b".to_string(),
                    time: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).single().expect("time"),
                },
                RecentEntry {
                    query: "a".to_string(),
                    time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("time"),
                },
            ],
        };
        let mut buf = Vec::new();
        write_text(&list, &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let queries: Vec<&str> = text.lines().filter_map(|l| l.split('\t').nth(1)).collect();
        assert_eq!(queries, vec!["b", "a"]);
    }
}
