//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use projctl_core::MAX_PARALLEL;
use projctl_core::config::CliOverrides;

/// Command-line client for project workspaces.
///
/// Downloads every file in a project (or one of its folders) into a single
/// zip archive.
#[derive(Parser, Debug)]
#[command(name = "projctl")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work with project files
    #[command(subcommand)]
    Files(FilesCommand),
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// Download all files in a project or folder into one zip archive
    Download(DownloadArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DownloadArgs {
    /// Project id to download from
    #[arg(long)]
    pub project: String,

    /// Restrict the download to one folder of the project
    #[arg(long)]
    pub folder: Option<String>,

    /// Maximum concurrent downloads (1-100, default 5)
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u8).range(1..=MAX_PARALLEL as i64))]
    pub parallel: Option<u8>,

    /// Archive path (default: files-YYYYMMDD-HHMMSS.zip)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

impl DownloadArgs {
    /// Values that override config file and environment settings.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            parallel: self.parallel.map(usize::from),
            output: self.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_args(args: &[&str]) -> DownloadArgs {
        let mut argv = vec!["projctl", "files", "download"];
        argv.extend_from_slice(args);
        let parsed = Args::try_parse_from(argv).unwrap();
        match parsed.command {
            Command::Files(FilesCommand::Download(args)) => args,
        }
    }

    #[test]
    fn test_cli_download_minimal_args() {
        let args = download_args(&["--project", "p-1"]);
        assert_eq!(args.project, "p-1");
        assert!(args.folder.is_none());
        assert!(args.parallel.is_none());
        assert!(args.output.is_none());
        assert_eq!(args.overrides(), CliOverrides::default());
    }

    #[test]
    fn test_cli_download_all_args() {
        let args = download_args(&[
            "--project", "p-1", "--folder", "f-9", "-p", "12", "-o", "out/files.zip",
        ]);
        assert_eq!(args.folder.as_deref(), Some("f-9"));
        assert_eq!(args.parallel, Some(12));
        assert_eq!(
            args.overrides(),
            CliOverrides {
                parallel: Some(12),
                output: Some(PathBuf::from("out/files.zip")),
            }
        );
    }

    #[test]
    fn test_cli_parallel_long_flag() {
        let args = download_args(&["--project", "p", "--parallel", "100"]);
        assert_eq!(args.parallel, Some(100));
    }

    #[test]
    fn test_cli_parallel_zero_rejected() {
        let result = Args::try_parse_from(["projctl", "files", "download", "--project", "p", "-p", "0"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_parallel_over_max_rejected() {
        let over = (MAX_PARALLEL + 1).to_string();
        let result = Args::try_parse_from([
            "projctl", "files", "download", "--project", "p", "-p", over.as_str(),
        ]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let max = MAX_PARALLEL.to_string();
        let args = download_args(&["--project", "p", "-p", max.as_str()]);
        assert_eq!(args.parallel.map(usize::from), Some(MAX_PARALLEL));
    }

    #[test]
    fn test_cli_project_is_required() {
        let result = Args::try_parse_from(["projctl", "files", "download"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["projctl", "-v", "files", "download", "--project", "p"])
            .unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["projctl", "files", "download", "--project", "p", "-vv"])
            .unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["projctl", "-q", "files", "download", "--project", "p"])
            .unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["projctl", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["projctl", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["projctl", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_missing_subcommand_returns_error() {
        let result = Args::try_parse_from(["projctl"]);
        assert!(result.is_err());
    }
}
