//! Minimal entry point. Full argument parsing and the wire adaptor that
//! exposes `index`/`search`/`deps` to external agent clients are out of
//! this crate's scope (`spec.md` §1); this binary only proves the
//! composition root wires together end to end.

use anyhow::{bail, Context, Result};
use repo_knowledge::{Endpoints, Stack};
use rk_pipeline::IndexOptions;
use rk_retriever::SearchOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "index".to_string());
    let project_root = std::env::current_dir().context("reading current directory")?;
    let stack = Stack::open(&project_root, Endpoints::from_env()).await?;

    match command.as_str() {
        "index" => {
            let full = args.any(|a| a == "--full");
            let report = stack
                .run_index(IndexOptions { full, with_summaries: true })
                .await?;
            tracing::info!(
                added = report.added,
                modified = report.modified,
                removed = report.removed,
                unchanged = report.unchanged,
                total_files = report.total_files,
                total_chunks = report.total_chunks,
                "index complete"
            );
        }
        "search" => {
            let query: String = args.collect::<Vec<_>>().join(" ");
            if query.trim().is_empty() {
                bail!("usage: repo-knowledge search <query>");
            }
            let results = stack.run_search(&query, SearchOptions::default()).await?;
            for result in results {
                println!(
                    "{}:{}-{} [{}] score={:.4}\n{}\n",
                    result.file_path,
                    result.start_line,
                    result.end_line,
                    result.match_type.as_str(),
                    result.score,
                    result.content
                );
            }
        }
        "deps" => {
            let identifier = args.next().context("usage: repo-knowledge deps <symbol-or-file> [depth]")?;
            let depth: usize = args
                .next()
                .map(|d| d.parse().context("depth must be a positive integer"))
                .transpose()?
                .unwrap_or(1);
            let results = stack.run_dependencies(&identifier, depth).await?;
            for result in results {
                println!(
                    "{}:{}-{} [{}] score={:.4}\n{}\n",
                    result.file_path,
                    result.start_line,
                    result.end_line,
                    result.match_type.as_str(),
                    result.score,
                    result.content
                );
            }
        }
        other => bail!("unknown command {other:?}, expected \"index\", \"search\", or \"deps\""),
    }

    Ok(())
}
