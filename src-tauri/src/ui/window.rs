use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::db::Clip;
use crate::utils::text::{age_label, preview};

/// Full history as a table: id, pin marker, age, preview.
pub fn render_table(clips: &[Clip], now: DateTime<Utc>, preview_length: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>5}  {:<1}  {:<10}  CONTENT", "ID", "★", "AGE");

    if clips.is_empty() {
        let _ = writeln!(out, "  (no clipboard history yet)");
        return out;
    }

    for clip in clips {
        let _ = writeln!(
            out,
            "{:>5}  {:<1}  {:<10}  {}",
            clip.id,
            if clip.pinned { "★" } else { " " },
            age_label(&clip.created_at, now),
            preview(&clip.content, preview_length)
        );
    }
    out
}
