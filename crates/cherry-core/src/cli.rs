use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::activity::{Category, Mood};
use crate::task::{Priority, Status};
use crate::view::{SortKey, SortOrder, View};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cherry",
    version,
    about = "Cherry: task views and productivity analytics",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Reference instant for every derivation (now/today/+2d/RFC3339);
    /// defaults to the wall clock.
    #[arg(long = "now", global = true)]
    pub now: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show a task view (today, upcoming, completed, all).
    List {
        #[arg(long, value_enum)]
        view: Option<View>,

        /// Refine by status.
        #[arg(long, value_enum)]
        status: Option<Status>,

        /// Refine by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,

        #[arg(long, value_enum, default_value_t = SortKey::CreatedAt)]
        sort: SortKey,

        #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,

        #[arg(long)]
        json: bool,
    },

    /// Per-view task counts (the sidebar badges).
    Counts {
        #[arg(long)]
        json: bool,
    },

    /// Aggregate analytics over the whole snapshot.
    Analytics {
        #[arg(long)]
        json: bool,
    },

    /// Dump a view as JSON.
    Export {
        #[arg(long, value_enum)]
        view: Option<View>,
    },

    /// Hourly activity grid for one day.
    Activity {
        #[command(subcommand)]
        command: ActivityCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ActivityCommand {
    /// Show a day's grid.
    Show {
        /// today/yesterday/tomorrow or YYYY-MM-DD; defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Record (or replace) one hour slot.
    Set {
        #[arg(long)]
        date: Option<String>,

        /// Hour of day, 0-23.
        #[arg(long)]
        hour: u8,

        #[arg(long)]
        activity: String,

        #[arg(long, value_enum, default_value_t = Category::Other)]
        category: Category,

        #[arg(long, value_enum, default_value_t = Mood::Neutral)]
        mood: Mood,

        /// 1 (low) to 5 (high).
        #[arg(long, default_value_t = 3)]
        productivity: u8,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Clear one hour slot.
    Remove {
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        hour: u8,
    },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{ActivityCommand, Command, GlobalCli};
    use crate::view::View;

    #[test]
    fn parses_list_with_view_and_now() {
        let cli = GlobalCli::try_parse_from([
            "cherry", "list", "--view", "upcoming", "--now", "2026-03-02T12:00",
        ])
        .expect("parse cli");

        assert_eq!(cli.now.as_deref(), Some("2026-03-02T12:00"));
        match cli.command {
            Some(Command::List { view, .. }) => assert_eq!(view, Some(View::Upcoming)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_activity_set() {
        let cli = GlobalCli::try_parse_from([
            "cherry",
            "activity",
            "set",
            "--hour",
            "9",
            "--activity",
            "standup",
            "--category",
            "work",
            "--mood",
            "good",
        ])
        .expect("parse cli");

        match cli.command {
            Some(Command::Activity {
                command: ActivityCommand::Set { hour, productivity, .. },
            }) => {
                assert_eq!(hour, 9);
                assert_eq!(productivity, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = GlobalCli::try_parse_from(["cherry", "-vv"]).expect("parse cli");
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 2);
    }
}
