//! The `lumen search` command: semantic search over the current directory.
//!
//! Images in the working directory are embedded once and cached in a SQLite
//! file next to them; later searches only embed what changed.

use clap::Args;
use lumen_core::api::EmbedInput;
use lumen_core::index::{refresh_index, EmbeddingCache, ImageDiscovery, IndexEvent};
use lumen_core::search::top_matches;
use lumen_core::Session;

use super::theme;

/// Arguments for the `search` command.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Text to search for
    pub query: String,

    /// Embedding mode [default: search.mode from config]
    #[arg(long)]
    pub mode: Option<String>,

    /// Number of results [default: search.top_k from config]
    #[arg(short = 'n', long = "limit")]
    pub limit: Option<usize>,
}

pub async fn execute(session: &Session, args: SearchArgs) -> anyhow::Result<()> {
    let client = session.vision_client()?;
    let search = &session.config().search;
    let mode = args.mode.as_deref().unwrap_or(&search.mode);
    let limit = args.limit.unwrap_or(search.top_k);

    let dir = std::env::current_dir()?;
    let files = ImageDiscovery::new(search).discover(&dir);
    let mut cache = EmbeddingCache::open_at(&dir.join(&search.index_file))?;

    let progress = theme::progress_bar(files.len() as u64);
    let stats = refresh_index(&mut cache, &files, &client, mode, |event| match event {
        IndexEvent::Reconciled { removed, .. } => {
            if removed > 0 {
                tracing::debug!(removed, "Dropped index entries for deleted files");
            }
        }
        IndexEvent::Cached { .. } => progress.inc(1),
        IndexEvent::Embedded { path } => {
            progress.set_message(path);
            progress.inc(1);
        }
        IndexEvent::Failed { path, message } => {
            progress.println(format!("  skipped {path}: {message}"));
            progress.inc(1);
        }
    })
    .await?;
    progress.finish_and_clear();

    tracing::info!(
        cached = stats.cached,
        embedded = stats.embedded,
        failed = stats.failed,
        removed = stats.removed,
        "Index refreshed"
    );
    if stats.failed > 0 {
        theme::warning(&format!(
            "{} image(s) could not be indexed and were left out",
            stats.failed
        ));
    }

    let entries = cache.all_entries()?;
    if entries.is_empty() {
        println!("No indexed images in {}", dir.display());
        return Ok(());
    }

    let spinner = theme::spinner("Searching...");
    let query = client.embed(&EmbedInput::Text(args.query.clone()), mode).await;
    spinner.finish_and_clear();
    let query = query?;

    for result in top_matches(&query, &entries, limit) {
        println!("{:.4}  {}", result.similarity, result.path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use lumen_core::{Config, LumenError, TokenStore};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SearchArgs,
    }

    #[test]
    fn test_args_defaults_come_from_config() {
        let cli = TestCli::parse_from(["lumen", "red car"]);
        assert_eq!(cli.args.query, "red car");
        assert!(cli.args.mode.is_none());
        assert!(cli.args.limit.is_none());

        let cli = TestCli::parse_from(["lumen", "red car", "-n", "3", "--mode", "fast"]);
        assert_eq!(cli.args.limit, Some(3));
        assert_eq!(cli.args.mode.as_deref(), Some("fast"));
    }

    #[tokio::test]
    async fn test_search_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::with_store(
            Config::default(),
            TokenStore::new(dir.path().join("credentials.json")),
        );

        let err = execute(
            &session,
            SearchArgs {
                query: "cat".to_string(),
                mode: None,
                limit: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LumenError>(),
            Some(LumenError::NotAuthenticated)
        ));
    }
}
