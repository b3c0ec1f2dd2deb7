//! Terminal rendering for the interactive host
//!
//! All functions return strings; the caller decides where they go.

use crate::command::api::{CommandError, CommandEvent, CommandEventType, HelpCategory, HelpCommand, Rejection};
use crate::core::error_handling::ContextualError;
use crate::core::styles::StyleRole;
use crate::history::api::HistoryError;
use chrono::{DateTime, Local};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

const INDENT: &str = "  ";
const COLUMN_GAP: usize = 3;

/// Pad `text` to `width` display columns
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Placeholders coloured inside a signature
fn paint_signature(signature: &str, color: bool) -> String {
    signature
        .split(' ')
        .map(|word| {
            if word.starts_with(['<', '[']) {
                StyleRole::Placeholder.paint(word, color)
            } else {
                StyleRole::Command.paint(word, color)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Category headers followed by aligned signature/description columns
pub fn render_help(sections: &[HelpCategory], color: bool) -> String {
    let width = sections
        .iter()
        .flat_map(|category| &category.commands)
        .map(|command| command.signature.width())
        .max()
        .unwrap_or(0)
        + COLUMN_GAP;

    let mut lines = Vec::new();
    for category in sections {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(StyleRole::Header.paint(&format!("{}:", category.name), color));
        for command in &category.commands {
            lines.extend(command_lines(command, width, color));
        }
    }
    lines.join("\n")
}

fn command_lines(command: &HelpCommand, width: usize, color: bool) -> Vec<String> {
    // Padding is computed on the plain text so escape codes do not skew it
    let fill = " ".repeat(width.saturating_sub(command.signature.width()));
    let mut lines = vec![format!(
        "{}{}{}{}",
        INDENT,
        paint_signature(&command.signature, color),
        fill,
        command.description
    )];

    let option_width = command
        .options
        .iter()
        .map(|option| option.flags.width())
        .max()
        .unwrap_or(0)
        + COLUMN_GAP;
    for option in &command.options {
        lines.push(format!(
            "{}{}{}",
            INDENT.repeat(3),
            StyleRole::Flag.paint(&pad(&option.flags, option_width), color),
            option.description
        ));
    }
    lines
}

/// Text for a resolved value; `None` when there is nothing to show
pub fn render_result(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => serde_json::to_string_pretty(other).ok(),
    }
}

/// User-facing text for a failed command
///
/// Known engine errors show their own message; anything else is shown as-is.
pub fn render_rejection(rejection: &Rejection, color: bool) -> String {
    let message = user_message(rejection).unwrap_or_else(|| rejection.to_string());
    StyleRole::Error.paint(&format!("Error: {}", message), color)
}

fn user_message(rejection: &Rejection) -> Option<String> {
    if let Some(error) = rejection.downcast_ref::<CommandError>() {
        return error.user_message();
    }
    if let Some(error) = rejection.downcast_ref::<HistoryError>() {
        return error.user_message();
    }
    None
}

/// One trace line per lifecycle event
pub fn render_event(event: &CommandEvent, color: bool) -> String {
    let timestamp: DateTime<Local> = event.timestamp.into();
    let time = StyleRole::Dim.paint(&timestamp.format("%H:%M:%S%.3f").to_string(), color);
    let label = pad(event.event_type.as_ref(), "complete".len());

    let detail = match event.event_type {
        CommandEventType::Execute => String::new(),
        CommandEventType::Complete => event
            .result
            .as_ref()
            .map(|result| format!(" -> {}", result))
            .unwrap_or_default(),
        CommandEventType::Error => event
            .error
            .as_ref()
            .map(|error| format!(" !! {}", error))
            .unwrap_or_default(),
    };

    let label = match event.event_type {
        CommandEventType::Error => StyleRole::Error.paint(&label, color),
        _ => StyleRole::Success.paint(&label, color),
    };
    format!("[{}] {} {}{}", time, label, event.command.trim(), detail)
}

/// Numbered listing, oldest first, numbering from 1
pub fn render_history(entries: &[String], color: bool) -> String {
    let width = entries.len().to_string().len();
    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let number = format!("{:>width$}", position + 1, width = width);
            format!("{}{}  {}", INDENT, StyleRole::Dim.paint(&number, color), entry)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
