use crate::db::models::{CatalogEntry, ImageRecord, RECORD_COLUMNS};

pub const EMPTY_CATALOG_MESSAGE: &str =
    "The catalog is empty. Add and save an image to see it here.";

const HEADERS: [&str; 4] = ["image_id", "style_name", "image_type", "image_path"];

fn entry_cells(entry: &CatalogEntry) -> [String; 4] {
    [
        entry.image_id.clone(),
        entry.style_name.clone().unwrap_or_default(),
        entry.image_type.clone().unwrap_or_default(),
        entry.image_path.clone().unwrap_or_default(),
    ]
}

/// Aligned plain-text table of the catalog projection.
pub fn render_catalog(entries: &[CatalogEntry]) -> String {
    if entries.is_empty() {
        return format!("{EMPTY_CATALOG_MESSAGE}\n");
    }

    let rows: Vec<[String; 4]> = entries.iter().map(entry_cells).collect();
    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header_cells = HEADERS.map(str::to_string);
    let mut out = String::new();
    out.push_str(&format_row(&header_cells[..]));
    out.push('\n');
    let rule = widths.map(|width| "-".repeat(width));
    out.push_str(&format_row(&rule[..]));
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(&row[..]));
        out.push('\n');
    }
    out.push_str(&format!("{} image(s)\n", rows.len()));
    out
}

pub fn render_record(record: &ImageRecord) -> String {
    let width = RECORD_COLUMNS
        .iter()
        .map(|column| column.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for column in RECORD_COLUMNS {
        let value = record.field(column).unwrap_or_default();
        out.push_str(&format!("{column:<width$}  {value}\n"));
    }
    out
}

pub fn render_trace(trace: &[String]) -> String {
    let mut out = String::from("Analysis trace:\n");
    for line in trace {
        out.push_str(&format!("  - {line}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(image_id: &str, style: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            image_id: image_id.to_string(),
            style_name: style.map(str::to_string),
            image_type: Some("AI-Generated".to_string()),
            image_path: Some(format!("data/uploads/{image_id}.jpg")),
        }
    }

    #[test]
    fn empty_catalog_renders_message() {
        assert_eq!(render_catalog(&[]), format!("{EMPTY_CATALOG_MESSAGE}\n"));
    }

    #[test]
    fn columns_are_aligned_to_widest_cell() {
        let table = render_catalog(&[entry("AI-001", Some("Dreamcore")), entry("B", None)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("image_id  style_name"));
        assert!(lines[2].starts_with("AI-001    Dreamcore   AI-Generated"));
        assert!(lines[3].starts_with(&format!("B{}AI-Generated", " ".repeat(21))));
        assert_eq!(lines[4], "2 image(s)");
    }

    #[test]
    fn record_lists_every_column() {
        let record = ImageRecord {
            image_id: "AI-001".to_string(),
            ..ImageRecord::default()
        };
        let rendered = render_record(&record);
        assert_eq!(rendered.lines().count(), 16);
        assert!(rendered.starts_with("image_id"));
        assert!(rendered.lines().next().unwrap().ends_with("AI-001"));
    }
}
