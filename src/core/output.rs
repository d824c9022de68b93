//! Output rendering helpers for CLI surfaces.
//!
//! Every command builds a JSON envelope; `--format text` renders a
//! human-readable view of the same result instead.

use crate::core::error::TaskGameError;
use crate::plugins::completion::Award;
use crate::plugins::leaderboard::{LocationGroup, Standing};
use clap::ValueEnum;
use colored::Colorize;
use serde_json::Value as JsonValue;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints `envelope` as JSON, or the text produced by `text`.
pub fn emit<F>(format: OutputFormat, envelope: &JsonValue, text: F) -> Result<(), TaskGameError>
where
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(envelope)?),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

pub fn render_leaderboard(standings: &[Standing]) -> String {
    if standings.is_empty() {
        return "No members.".to_string();
    }
    let mut out = vec![format!("{}", "🏆 Leaderboard".bold())];
    for s in standings {
        let line = format!("{} {}. {}: {} points", s.medal, s.rank, s.member, s.points);
        out.push(if s.rank == 1 {
            line.bright_yellow().bold().to_string()
        } else {
            line
        });
    }
    out.join("\n")
}

pub fn render_board(member: &str, member_points: u64, groups: &[LocationGroup]) -> String {
    let mut out = vec![
        format!("{} {}", "🎮 Board -".bold(), member.bold()),
        format!("Points: {}", member_points.to_string().bright_green().bold()),
    ];
    for group in groups {
        out.push(String::new());
        out.push(format!("📍 {}", group.location).bright_cyan().bold().to_string());
        for entry in &group.chores {
            let points = if entry.has_bonus {
                format!(
                    "{} pts ⚡ (base: {})",
                    entry.current_points, entry.base_points
                )
                .bright_yellow()
                .to_string()
            } else {
                format!("{} pts", entry.current_points)
            };
            let mut line = format!("  - {} [{}]", compact_line(&entry.chore, 48), points);
            if let Some(days) = entry.days_since_done {
                line.push_str(&format!(" 🕒 {} day(s) ago", days));
                if let Some(by) = &entry.last_completed_by {
                    line.push_str(&format!(" by {}", by));
                }
            }
            if !entry.eligible {
                line = line.dimmed().to_string();
            }
            out.push(line);
        }
    }
    out.join("\n")
}

pub fn render_award(award: &Award) -> String {
    format!(
        "{} {} now has {} points.",
        format!("+{} points!", award.points_awarded).bright_green().bold(),
        award.member,
        award.member_total
    )
}
