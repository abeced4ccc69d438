//! Interactive session loop.
//!
//! Reads one command per line, applies it to an [`Explorer`] and writes
//! the result. Failures are reported and the loop carries on.

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use explorer_common::{ExplorerError, ExplorerResult};
use explorer_state::{Channel, Transition};

use crate::command::{help, parse_command, Command};
use crate::report::Report;
use crate::session::Explorer;

/// What the loop does after a command.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue(String),
    Quit,
}

/// Run commands from `input` until it ends or `quit` is read.
pub async fn run<R, W>(explorer: &mut Explorer, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "error: {}", message)?;
                continue;
            }
        };
        debug!(?command, "Session command");
        let flow = execute(explorer, command).await;
        let quit = write_outcome(flow, out)?;
        out.flush()?;
        if quit {
            break;
        }
    }
    Ok(())
}

/// Print a command's result. Returns true when the loop should stop;
/// errors that are not recoverable end the session with that error.
fn write_outcome<W: Write>(flow: ExplorerResult<Flow>, out: &mut W) -> anyhow::Result<bool> {
    match flow {
        Ok(Flow::Continue(output)) => {
            if !output.is_empty() {
                writeln!(out, "{}", output)?;
            }
            Ok(false)
        }
        Ok(Flow::Quit) => Ok(true),
        Err(e) if !e.is_recoverable() => Err(e.into()),
        Err(e) => {
            writeln!(out, "error: {}", e)?;
            Ok(false)
        }
    }
}

/// Apply one command to the session.
pub async fn execute(explorer: &mut Explorer, command: Command) -> ExplorerResult<Flow> {
    let output = match command {
        Command::Search(pairs) => {
            explorer.search(&pairs)?;
            listing(explorer).await?
        }
        Command::ClearSearch => {
            explorer.clear_search();
            listing(explorer).await?
        }
        Command::Page(page) => {
            explorer.set_page(page).await?;
            listing_table(explorer)
        }
        Command::Next => {
            explorer.next_page().await?;
            listing_table(explorer)
        }
        Command::Prev => {
            explorer.previous_page().await?;
            listing_table(explorer)
        }
        Command::List => listing_table(explorer),
        Command::Select(row) => {
            let transition = explorer.select_row(row).await?;
            layer_summary(explorer, transition)
        }
        Command::Band { channel, value } => {
            let transition = explorer.select_rgb_band(channel, &value).await?;
            layer_summary(explorer, transition)
        }
        Command::Colormap(colormap) => {
            let transition = explorer.set_colormap(&colormap)?;
            let summary = layer_summary(explorer, transition);
            match explorer.colormap_preview(&colormap).await {
                Ok(entries) => format!("{}\n{}", summary, Report::format_colormap(&colormap, &entries)),
                Err(e) => format!("{}\nerror: colormap preview unavailable: {}", summary, e),
            }
        }
        Command::Stretch(stretch) => {
            let transition = explorer.set_stretch(stretch)?;
            layer_summary(explorer, transition)
        }
        Command::RgbStretch { channel, stretch } => {
            let transition = explorer.set_rgb_stretch(channel, stretch)?;
            layer_summary(explorer, transition)
        }
        Command::Clear => {
            let transition = explorer.clear_layer();
            layer_summary(explorer, transition)
        }
        Command::Url => match (explorer.tile_url(), explorer.active_preview_url()) {
            (Some(tiles), Some(preview)) => format!("tiles:   {}\npreview: {}", tiles, preview),
            _ => "no active layer".to_string(),
        },
        Command::State => Report::format_layer(explorer.layers()),
        Command::Errors => Report::format_errors(explorer.errors()),
        Command::Dismiss(id) => {
            if explorer.dismiss_error(id) {
                format!("dismissed error {}", id)
            } else {
                format!("no error with id {}", id)
            }
        }
        Command::Help => help(),
        Command::Quit => return Ok(Flow::Quit),
    };
    Ok(Flow::Continue(output))
}

async fn listing(explorer: &mut Explorer) -> ExplorerResult<String> {
    explorer.load_page().await?;
    Ok(listing_table(explorer))
}

fn listing_table(explorer: &Explorer) -> String {
    Report::format_datasets(explorer.keys(), explorer.results(), explorer.query())
}

fn layer_summary(explorer: &Explorer, transition: Transition) -> String {
    let status = match transition {
        Transition::Activated => format!("{} layer active", explorer.active().kind()),
        Transition::Deactivated => "layer removed".to_string(),
        Transition::Updated => "layer updated".to_string(),
        Transition::Pending => {
            let selection = explorer.layers().rgb_selection();
            let missing: Vec<String> = Channel::ALL
                .iter()
                .filter(|c| selection.band(**c).is_none())
                .map(|c| c.to_string())
                .collect();
            format!("rgb selection pending, missing {}", missing.join(", "))
        }
        Transition::Unchanged => "no change".to_string(),
    };
    match explorer.tile_url() {
        Some(url) => format!("{}\n{}", status, url),
        None => status,
    }
}
