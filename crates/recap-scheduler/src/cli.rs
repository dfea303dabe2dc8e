use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "recap-scheduler", version, about = "Periodic auto-summary of stored chat sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Check on a fixed interval until interrupted (default)
    Run,
    /// Run a single check and print the outcome as JSON
    Once {
        /// Collection prefix for the summary key
        #[arg(long)]
        collection: Option<String>,
    },
    /// Print session counts and summary metadata without triggering
    Status,
    /// Delete keys matching a glob pattern
    Purge {
        pattern: String,
        /// List matching keys without deleting them
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["recap-scheduler"]);
        assert_eq!(cli.command(), Command::Run);
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["recap-scheduler", "once", "--collection", "digest"]);
        assert_eq!(cli.command(), Command::Once { collection: Some("digest".to_string()) });

        let cli = Cli::parse_from(["recap-scheduler", "purge", "summary:*", "--dry-run"]);
        assert_eq!(
            cli.command(),
            Command::Purge { pattern: "summary:*".to_string(), dry_run: true }
        );
    }
}
