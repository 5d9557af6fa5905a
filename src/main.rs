// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use segdl::args::Args;
use segdl::mime;
use segdl::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(args: &Args) {
    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn load_mime_table(args: &Args) -> Result<()> {
    let table = match MimeTable::load(&args.mime_table).await {
        Ok(table) => {
            info!(path = %args.mime_table.display(), entries = table.len(), "loaded mime table");
            table
        }
        Err(e) => {
            warn!(path = %args.mime_table.display(), error = %e, "mime table unavailable, using built-in types");
            MimeTable::builtin()
        }
    };
    mime::init_global(table).context("installing mime table")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);
    load_mime_table(&args).await?;

    let spec = DownloadSpec::resolve(args.url.clone(), args.threads, args.segment_length, args.dest.clone())
        .context("invalid download options")?
        .with_timeout(Duration::from_secs(args.timeout));

    let progress: Arc<dyn ProgressObserver> = if args.quiet || args.json {
        Arc::new(LogProgress)
    } else {
        Arc::new(ConsoleProgress::new())
    };
    let coordinator = DownloadCoordinator::new().with_progress(progress);

    let shutdown = coordinator.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling download");
            shutdown.cancel();
        }
    });

    let summary = coordinator
        .run(&spec)
        .await
        .with_context(|| format!("download of {} failed", spec.url))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Saved {} ({} bytes, {} segments) in {:.2}s",
            summary.path.display(),
            summary.bytes_written,
            summary.segments,
            summary.elapsed_ms as f64 / 1000.0
        );
    }
    Ok(())
}
