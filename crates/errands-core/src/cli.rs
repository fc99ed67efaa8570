use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "errands",
    version,
    about = "Errands: task-lists from the terminal"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "errandsrc", global = true)]
    pub errandsrc: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the sidebar: every list, with the selected one marked
    Lists,

    /// Add a list and select it
    Add { name: String },

    /// Rename a list
    Rename { list: String, new_name: String },

    /// Delete a list together with its tasks
    Delete { list: String },

    /// Switch to a list and print its tasks
    Show { list: Option<String> },

    /// Add a task to a list
    Task { list: String, text: String },

    /// Mark the task at a 1-based position in a list as done
    Done { list: String, index: usize },

    /// Print the main menu entries
    Menu,
}

impl Command {
    /// Maps a `default.command` value onto a command that takes no
    /// arguments.
    pub fn from_default(name: &str) -> anyhow::Result<Self> {
        match name {
            "lists" => Ok(Self::Lists),
            "show" => Ok(Self::Show { list: None }),
            "menu" => Ok(Self::Menu),
            other => Err(anyhow!("unsupported default.command: {other}")),
        }
    }
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
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_globals_after_subcommand() {
        let cli = GlobalCli::try_parse_from([
            "errands",
            "rename",
            "Work",
            "Work Tasks",
            "-vv",
            "--rc",
            "color=off",
        ])
        .expect("parse");

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(cli.rc_overrides[0].key, "color");
        assert_eq!(
            cli.command,
            Some(Command::Rename {
                list: "Work".to_string(),
                new_name: "Work Tasks".to_string(),
            })
        );
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = GlobalCli::try_parse_from(["errands"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn default_command_names() {
        assert_eq!(Command::from_default("lists").expect("lists"), Command::Lists);
        assert!(Command::from_default("delete").is_err());
    }

    #[test]
    fn rc_override_needs_equals() {
        assert!("color".parse::<KeyVal>().is_err());
    }
}
