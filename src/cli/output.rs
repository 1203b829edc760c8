//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::env;

use crate::domain::models::{Campaign, CampaignRisk};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum length, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Render flagged campaigns as a table, worst first.
pub fn campaign_table(campaigns: &[Campaign]) -> String {
    let use_colors = supports_color();
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Risk").add_attribute(Attribute::Bold),
        Cell::new("Launch").add_attribute(Attribute::Bold),
    ]);

    for campaign in campaigns {
        let id_short = &campaign.id.to_string()[..8];
        let risk_cell = if use_colors {
            Cell::new(campaign.risk_status.as_str()).fg(risk_color(campaign.risk_status))
        } else {
            Cell::new(campaign.risk_status.as_str())
        };
        table.add_row(vec![
            Cell::new(id_short),
            Cell::new(truncate(&campaign.name, 40)),
            risk_cell,
            Cell::new(campaign.launch_date.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    table.to_string()
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn risk_color(risk: CampaignRisk) -> Color {
    match risk {
        CampaignRisk::Normal => Color::Green,
        CampaignRisk::AtRisk => Color::Yellow,
        CampaignRisk::HighRisk => Color::Red,
    }
}
