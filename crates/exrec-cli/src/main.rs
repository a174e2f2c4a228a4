use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(name = "exrec")]
#[command(about = "exrec - stateless, directory-backed experience record store", long_about = None)]
struct Cli {
    /// Storage root for session directories
    #[arg(long, global = true, env = "EXREC_ROOT")]
    root: Option<PathBuf>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when EXREC_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a session directory and stage its summary
    Init {
        /// Session id; a UUID is generated when omitted
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        context: String,
        #[arg(long, default_value = "")]
        summary: String,
        /// Comma-separated flow steps
        #[arg(long, value_delimiter = ',')]
        flow: Vec<String>,
        /// Comma-separated topics
        #[arg(long, value_delimiter = ',')]
        topics: Vec<String>,
        /// JSON object file with metadata, or `-` for stdin
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Write (or replace) one numbered batch of records
    WriteBatch {
        session_id: String,
        batch_number: u32,
        /// JSON array of records, or `-` for stdin
        records: String,
    },
    /// Write (or replace) the session notes
    WriteNotes {
        session_id: String,
        /// JSON object file, or `-` for stdin
        notes: String,
    },
    /// Aggregate the session into its manifest
    Finalize { session_id: String },
    /// Show the session state derived from its directory
    Status { session_id: String },
    /// List completed sessions
    List {
        /// JSON filter file, or `-` for stdin
        #[arg(long)]
        filter: Option<String>,
    },
    /// Validate a session directory
    Validate {
        /// Session directory
        #[arg(required_unless_present = "session_id")]
        directory: Option<PathBuf>,
        /// Validate the session with this id under the storage root instead
        #[arg(long, conflicts_with = "directory")]
        session_id: Option<String>,
    },
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = commands::config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.storage_root = Some(root);
    }

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    commands::logging::init(level, cli.log_json);

    let repo = commands::config::repository(&config)?;

    match cli.command {
        Commands::Init {
            session_id,
            name,
            context,
            summary,
            flow,
            topics,
            metadata,
        } => commands::session::init(
            &repo,
            commands::session::InitArgs {
                session_id,
                name,
                context,
                summary,
                flow,
                topics,
                metadata,
            },
        )?,
        Commands::WriteBatch {
            session_id,
            batch_number,
            records,
        } => commands::session::write_batch(&repo, &session_id, batch_number, &records)?,
        Commands::WriteNotes { session_id, notes } => {
            commands::session::write_notes(&repo, &session_id, &notes)?
        }
        Commands::Finalize { session_id } => commands::session::finalize(&repo, &session_id)?,
        Commands::Status { session_id } => commands::session::status(&repo, &session_id)?,
        Commands::List { filter } => commands::inspect::list(&repo, filter.as_deref())?,
        Commands::Validate {
            directory,
            session_id,
        } => {
            let valid = commands::inspect::validate(&repo, directory, session_id.as_deref())?;
            if !valid {
                return Ok(ExitCode::from(2));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            commands::output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_write_batch() {
        let cli =
            Cli::try_parse_from(["exrec", "--root", "/tmp/x", "write-batch", "s1", "3", "-"])
                .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/x")));
        match cli.command {
            Commands::WriteBatch {
                session_id,
                batch_number,
                records,
            } => {
                assert_eq!(session_id, "s1");
                assert_eq!(batch_number, 3);
                assert_eq!(records, "-");
            }
            _ => panic!("expected write-batch"),
        }
    }

    #[test]
    fn test_parse_init_splits_lists() {
        let cli = Cli::try_parse_from([
            "exrec", "init", "--name", "n", "--context", "c", "--topics", "rust,cli",
        ])
        .unwrap();
        match cli.command {
            Commands::Init { topics, flow, .. } => {
                assert_eq!(topics, vec!["rust", "cli"]);
                assert!(flow.is_empty());
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn test_validate_requires_target() {
        assert!(Cli::try_parse_from(["exrec", "validate"]).is_err());
        assert!(Cli::try_parse_from(["exrec", "validate", "--session-id", "s1"]).is_ok());
    }

    #[test]
    fn test_negative_batch_rejected_by_parser() {
        assert!(Cli::try_parse_from(["exrec", "write-batch", "s1", "-1", "-"]).is_err());
    }
}
