//! Line-oriented command language for the interactive session.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

use explorer_common::Stretch;
use explorer_state::Channel;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `search K=V ...`; an empty value clears that key.
    Search(Vec<(String, String)>),
    ClearSearch,
    Page(u32),
    Next,
    Prev,
    List,
    /// Zero-based row on the current page.
    Select(usize),
    Band { channel: Channel, value: String },
    Colormap(String),
    Stretch(Stretch),
    RgbStretch { channel: Channel, stretch: Stretch },
    Clear,
    Url,
    State,
    Errors,
    Dismiss(u64),
    Help,
    Quit,
}

/// Grammar of one session line.
#[derive(Parser, Debug)]
#[command(
    name = "explorer",
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    help_template = "{subcommands}"
)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Constrain keys (K= clears one)
    Search {
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<(String, String)>,
    },
    /// Drop all constraints
    ClearSearch,
    /// Jump to a page of the listing
    Page { page: u32 },
    /// Next page
    Next,
    /// Previous page
    Prev,
    /// Show the current page
    #[command(alias = "ls")]
    List,
    /// Toggle the singleband layer of a row
    Select { row: usize },
    /// Assign a band to an RGB channel
    Band {
        #[arg(value_parser = parse_channel)]
        channel: Channel,
        value: String,
    },
    /// Colormap for singleband layers
    Colormap { id: String },
    /// Singleband stretch
    Stretch {
        #[arg(allow_negative_numbers = true, value_parser = parse_bound)]
        min: f64,
        #[arg(allow_negative_numbers = true, value_parser = parse_bound)]
        max: f64,
    },
    /// Stretch of one RGB channel
    RgbStretch {
        #[arg(value_parser = parse_channel)]
        channel: Channel,
        #[arg(allow_negative_numbers = true, value_parser = parse_bound)]
        min: f64,
        #[arg(allow_negative_numbers = true, value_parser = parse_bound)]
        max: f64,
    },
    /// Remove the active layer
    Clear,
    /// Tile URLs of the active layer
    Url,
    /// Show the active layer
    State,
    /// List errors
    Errors,
    /// Remove one error
    Dismiss { id: u64 },
    /// Show this list
    #[command(alias = "?")]
    Help,
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

impl From<SessionCommand> for Command {
    fn from(command: SessionCommand) -> Self {
        match command {
            SessionCommand::Search { pairs } => Command::Search(pairs),
            SessionCommand::ClearSearch => Command::ClearSearch,
            SessionCommand::Page { page } => Command::Page(page),
            SessionCommand::Next => Command::Next,
            SessionCommand::Prev => Command::Prev,
            SessionCommand::List => Command::List,
            SessionCommand::Select { row } => Command::Select(row),
            SessionCommand::Band { channel, value } => Command::Band { channel, value },
            SessionCommand::Colormap { id } => Command::Colormap(id),
            SessionCommand::Stretch { min, max } => Command::Stretch(Stretch::new(min, max)),
            SessionCommand::RgbStretch { channel, min, max } => Command::RgbStretch {
                channel,
                stretch: Stretch::new(min, max),
            },
            SessionCommand::Clear => Command::Clear,
            SessionCommand::Url => Command::Url,
            SessionCommand::State => Command::State,
            SessionCommand::Errors => Command::Errors,
            SessionCommand::Dismiss { id } => Command::Dismiss(id),
            SessionCommand::Help => Command::Help,
            SessionCommand::Quit => Command::Quit,
        }
    }
}

/// Parse one input line. Blank lines are an error the caller should skip.
pub fn parse_command(line: &str) -> Result<Command, String> {
    if line.trim().is_empty() {
        return Err("empty command".to_string());
    }
    SessionLine::try_parse_from(line.split_whitespace())
        .map(|parsed| parsed.command.into())
        .map_err(|e| error_message(&e, line))
}

/// Command list shown by `help`.
pub fn help() -> String {
    SessionLine::command().render_help().to_string()
}

/// First line of a clap error, without its `error: ` prefix.
fn error_message(err: &clap::Error, line: &str) -> String {
    if err.kind() == ErrorKind::InvalidSubcommand {
        let name = line.split_whitespace().next().unwrap_or_default();
        return format!("unknown command '{}' (try 'help')", name);
    }
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

fn parse_pair(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg))
}

fn parse_channel(arg: &str) -> Result<Channel, String> {
    Channel::parse(arg).ok_or_else(|| format!("channel must be r, g or b (got '{}')", arg))
}

fn parse_bound(arg: &str) -> Result<f64, String> {
    let value: f64 = arg.parse().map_err(|_| format!("not a number: '{}'", arg))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("stretch bounds must be finite".to_string())
    }
}
