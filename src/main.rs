//! CLI entry point for projctl.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use projctl_core::config::{EnvOverrides, ResolvedConfig, load_default_file_config};
use projctl_core::{
    ApiClient, ApiFileSource, BulkOptions, BulkOutcome, ConsoleReporter, FileScope, HttpClient,
    build_http_client, download_to_archive,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, Command, DownloadArgs, FilesCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match &args.command {
        Command::Files(FilesCommand::Download(download)) => {
            run_download(download, args.quiet).await
        }
    }
}

async fn run_download(args: &DownloadArgs, quiet: bool) -> Result<()> {
    let file_config = load_default_file_config()?;
    let config = ResolvedConfig::merge(
        args.overrides(),
        EnvOverrides::from_env(),
        file_config.as_ref(),
    )?;
    debug!(
        api_url = %config.api_url,
        files_url = %config.files_url,
        parallel = config.parallel,
        "configuration resolved"
    );

    let http = build_http_client(&config.credentials, config.timeouts)
        .context("Failed to build HTTP client")?;
    let source = ApiFileSource::new(
        ApiClient::new(http.clone(), &config.api_url).context("Invalid API URL")?,
    );
    let fetcher = HttpClient::new(http, &config.files_url).context("Invalid files URL")?;

    let scope = FileScope::project(args.project.clone()).with_folder(args.folder.clone());
    let options = BulkOptions::new(config.parallel, config.output);
    info!(project = %scope.project_id, "Starting bulk download");

    let outcome = download_to_archive(
        &source,
        &scope,
        Arc::new(fetcher),
        &options,
        Arc::new(ConsoleReporter::new(quiet)),
    )
    .await?;

    match outcome {
        BulkOutcome::NoFiles => println!("no files found"),
        BulkOutcome::Archived { path, summary } => {
            println!("{summary}");
            println!("archive: {}", path.display());
        }
    }

    Ok(())
}
