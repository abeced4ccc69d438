//! Console tables for keys, listings, metadata and session state.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::Serialize;

use explorer_client::DatasetQuery;
use explorer_common::{default_stretch, ColormapEntry, DatasetIdentity, DatasetRecord, Key, Metadata};
use explorer_state::{ActiveLayer, Channel, ErrorLog, LayerState};

/// Formats explorer data for output.
pub struct Report;

impl Report {
    fn table() -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
        table
    }

    pub fn format_keys(keys: &[Key]) -> String {
        let mut table = Self::table();
        table.set_header(vec!["Key", "Description"]);
        for key in keys {
            table.add_row(vec![key.key.as_str(), key.description.as_deref().unwrap_or("")]);
        }
        table.to_string()
    }

    /// One row per dataset, numbered for `select`, columns in key order.
    pub fn format_datasets(keys: &[Key], records: &[DatasetRecord], query: &DatasetQuery) -> String {
        let mut table = Self::table();
        let mut header = vec!["#".to_string()];
        header.extend(keys.iter().map(|k| k.key.clone()));
        table.set_header(header);

        for (row, record) in records.iter().enumerate() {
            let mut cells = vec![row.to_string()];
            cells.extend(record.ordered_values(keys));
            table.add_row(cells);
        }

        let constraints: Vec<String> = query
            .constraints()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!(
            "{}\nPage {} ({} per page, {} shown){}",
            table,
            query.page(),
            query.limit(),
            records.len(),
            if constraints.is_empty() {
                String::new()
            } else {
                format!(", where {}", constraints.join(" "))
            }
        )
    }

    pub fn format_metadata(identity: &DatasetIdentity, metadata: &Metadata) -> String {
        let mut table = Self::table();
        table.set_header(vec![format!("Dataset: {}", identity)]);
        let [west, south, east, north] = metadata.bounds;
        table.add_row(vec![
            "Bounds:".to_string(),
            format!("{:.4}, {:.4}, {:.4}, {:.4}", west, south, east, north),
        ]);
        table.add_row(vec![
            "Range:".to_string(),
            format!("{} .. {}", metadata.range[0], metadata.range[1]),
        ]);
        table.add_row(vec!["Mean:".to_string(), format!("{:.4}", metadata.mean)]);
        table.add_row(vec!["Std dev:".to_string(), format!("{:.4}", metadata.stdev)]);
        table.add_row(vec![
            "Valid:".to_string(),
            format!("{:.1}%", metadata.valid_percentage),
        ]);
        table.add_row(vec![
            "Percentiles:".to_string(),
            metadata.percentiles.len().to_string(),
        ]);
        table.add_row(vec![
            "Default stretch:".to_string(),
            default_stretch(metadata).to_string(),
        ]);
        table.to_string()
    }

    pub fn format_layer(state: &LayerState) -> String {
        let mut table = Self::table();
        table.set_header(vec![format!("Active layer: {}", state.active().kind())]);

        match state.active() {
            ActiveLayer::None => {}
            ActiveLayer::Singleband(layer) => {
                table.add_row(vec!["Dataset:".to_string(), layer.identity.to_string()]);
                table.add_row(vec!["Colormap:".to_string(), layer.colormap.clone()]);
                table.add_row(vec![
                    "Stretch:".to_string(),
                    stretch_cell(&layer.stretch.to_string(), layer.provisional),
                ]);
            }
            ActiveLayer::Rgb(layer) => {
                table.add_row(vec!["Index:".to_string(), layer.index_keys.join("/")]);
                for channel in Channel::ALL {
                    let i = channel.index();
                    table.add_row(vec![
                        format!("{}:", channel),
                        format!(
                            "{} {}",
                            layer.bands[i],
                            stretch_cell(&layer.stretches[i].to_string(), layer.provisional[i])
                        ),
                    ]);
                }
            }
        }

        let selection = state.rgb_selection();
        if !selection.is_complete() && Channel::ALL.iter().any(|c| selection.band(*c).is_some()) {
            let picks: Vec<String> = Channel::ALL
                .iter()
                .map(|c| format!("{}={}", c, selection.band(*c).unwrap_or("-")))
                .collect();
            table.add_row(vec!["RGB pending:".to_string(), picks.join(" ")]);
        }
        table.add_row(vec!["Default colormap:".to_string(), state.colormap().to_string()]);
        table.to_string()
    }

    pub fn format_errors(errors: &ErrorLog) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }
        let mut table = Self::table();
        table.set_header(vec!["Id", "Time", "Message"]);
        for entry in errors.entries() {
            table.add_row(vec![
                entry.id.to_string(),
                entry.at.format("%H:%M:%S").to_string(),
                entry.message.clone(),
            ]);
        }
        table.to_string()
    }

    pub fn format_colormap(colormap: &str, entries: &[ColormapEntry]) -> String {
        let mut table = Self::table();
        table.set_header(vec![format!("Colormap: {} ({} values)", colormap, entries.len())]);
        for (i, entry) in entries.iter().enumerate() {
            table.add_row(vec![i.to_string(), entry.hex()]);
        }
        table.to_string()
    }

    /// Format any serializable value as JSON.
    pub fn format_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

fn stretch_cell(stretch: &str, provisional: bool) -> String {
    if provisional {
        format!("{} (pending metadata)", stretch)
    } else {
        stretch.to_string()
    }
}
