// SPDX-License-Identifier: Apache-2.0

use crate::{CliError, OutputMode};
use keepsake_client::GridLayout;
use keepsake_model::PublicItem;
use serde_json::Value;

const CELL_WIDTH: usize = 28;

pub(crate) fn emit_ok(output_mode: OutputMode, payload: Value) -> Result<(), CliError> {
    let text = if output_mode.json {
        serde_json::to_string(&payload)
    } else {
        serde_json::to_string_pretty(&payload)
    }
    .map_err(|e| CliError::internal(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn cell(text: &str) -> String {
    let mut out: String = text.chars().take(CELL_WIDTH).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(CELL_WIDTH - len));
    out
}

/// Captions laid out in grid rows, each followed by its tag and id.
pub(crate) fn render_grid(grid: &GridLayout, items: &[PublicItem]) -> String {
    if items.is_empty() {
        return "(no items)".to_string();
    }
    let mut lines = Vec::new();
    for row in grid.rows(items) {
        let captions: Vec<String> = row.iter().map(|i| cell(&i.caption_text)).collect();
        let tags: Vec<String> = row
            .iter()
            .map(|i| cell(&format!("[{}] {}", i.tag, i.id)))
            .collect();
        lines.push(captions.join(" | ").trim_end().to_string());
        lines.push(tags.join(" | ").trim_end().to_string());
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_model::Tag;

    fn item(id: &str, caption: &str) -> PublicItem {
        PublicItem {
            id: id.to_string(),
            src: format!("images/uploads/{id}.jpg"),
            alt: String::new(),
            caption_text: caption.to_string(),
            tag: Tag::default(),
            created_at: 0,
        }
    }

    #[test]
    fn grid_wraps_rows_at_column_count() {
        let grid = GridLayout::new(2).expect("grid");
        let text = render_grid(&grid, &[item("a", "One"), item("b", "Two"), item("c", "Three")]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("One"));
        assert!(lines[0].contains("| Two"));
        assert!(lines[3].starts_with("Three"));
        assert!(lines[4].contains("[nature] c"));
    }

    #[test]
    fn empty_gallery_renders_placeholder() {
        assert_eq!(render_grid(&GridLayout::default(), &[]), "(no items)");
    }
}
