//! Table rendering for stored records.
//!
//! Rendering is read-only: records are never mutated, and the same records
//! always produce the same text.

use colored::Colorize;

use crate::schema::Record;

/// Printed instead of a table when the store is empty.
pub const NO_RECORDS_NOTICE: &str = "No repositories found in the database.";

const TITLE: &str = "Top GitHub Repositories";
const HEADERS: [&str; 4] = ["Repository", "Stars", "Language", "Description"];
const MAX_SUMMARY_CHARS: usize = 60;
const COLUMN_GAP: &str = "  ";

/// Render records as a titled table, in the order given.
pub fn render_records(records: &[Record]) -> String {
    if records.is_empty() {
        return format!("{}\n", NO_RECORDS_NOTICE.yellow());
    }

    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            [
                r.identifier.clone(),
                r.popularity.to_string(),
                r.primary_language.clone(),
                elide(&r.summary, MAX_SUMMARY_CHARS),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", TITLE.bold()));

    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(col, (h, w))| pad(h, w, col == 1).magenta().bold().to_string())
        .collect();
    out.push_str(header.join(COLUMN_GAP).trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|&w| "─".repeat(w)).collect();
    out.push_str(&rule.join(COLUMN_GAP));
    out.push('\n');

    for row in &rows {
        // Pad first so escape codes never count toward the width
        let cells = [
            pad(&row[0], widths[0], false).cyan().to_string(),
            pad(&row[1], widths[1], true).green().to_string(),
            pad(&row[2], widths[2], false).yellow().to_string(),
            row[3].dimmed().to_string(),
        ];
        out.push_str(cells.join(COLUMN_GAP).trim_end());
        out.push('\n');
    }

    out
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{:>width$}", text, width = width)
    } else {
        format!("{:<width$}", text, width = width)
    }
}

fn elide(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head.trim_end())
}
