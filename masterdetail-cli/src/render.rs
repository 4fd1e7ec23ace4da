//! Plain-text rendering of grid snapshots.

use std::fmt::Write;

use masterdetail_lib::compose::DisplayRow;
use masterdetail_lib::grid::DetailView;
use masterdetail_lib::grid::GridView;
use masterdetail_lib::model::ColumnDef;
use masterdetail_lib::model::EXPAND_FIELD;
use masterdetail_lib::model::GridRow;
use masterdetail_lib::model::lookup_path;
use masterdetail_lib::query::PaginationModel;
use serde_json::Value;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// Pixels per terminal cell when converting column width hints.
const CELL_PX: u16 = 8;

const MIN_CELLS: usize = 3;
const MAX_CELLS: usize = 40;
const DETAIL_INDENT: &str = "    ";

fn cells(column: &ColumnDef) -> usize {
    usize::from(column.width / CELL_PX).clamp(MIN_CELLS, MAX_CELLS)
}

/// Truncates to `width` display cells, ending in `…` when cut, and pads.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    if text.width() <= width {
        out.push_str(text);
    } else {
        let mut used = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(ch);
            used += w;
        }
        out.push('…');
    }
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat_n(' ', pad));
    out
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.replace(['\n', '\r'], " "),
        Some(other) => other.to_string(),
    }
}

fn header(columns: &[ColumnDef]) -> String {
    columns
        .iter()
        .map(|c| fit(&c.header_name, cells(c)))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

fn record_line(record: &Value, columns: &[ColumnDef], expanded: Option<bool>) -> String {
    columns
        .iter()
        .map(|c| {
            let text = if c.field == EXPAND_FIELD {
                match expanded {
                    Some(true) => "-".to_string(),
                    Some(false) => "+".to_string(),
                    None => String::new(),
                }
            } else {
                cell_text(lookup_path(record, &c.field))
            };
            fit(&text, cells(c))
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

fn pager(pagination: &PaginationModel, total_count: u64) -> String {
    let size = pagination.page_size.max(1) as u64;
    let pages = total_count.div_ceil(size).max(1);
    format!(
        "page {} of {} ({} total, {} per page)",
        pagination.page_number(),
        pages,
        total_count,
        pagination.page_size
    )
}

/// Renders the master table with detail panels in place of marker rows.
pub fn grid<R, F>(view: &GridView<R>, mut detail: F) -> String
where
    R: GridRow + serde::Serialize,
    F: FnMut(&masterdetail_lib::model::RowId) -> Option<DetailView>,
{
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title);
    let _ = writeln!(out, "{}", header(&view.columns));

    let expanded: Vec<_> = view
        .rows
        .iter()
        .filter_map(|row| match row {
            DisplayRow::Detail(marker) => Some(marker.parent_id.clone()),
            DisplayRow::Master(_) => None,
        })
        .collect();

    for row in &view.rows {
        match row {
            DisplayRow::Master(record) => {
                let is_expanded = record.row_id().map(|id| expanded.contains(&id));
                let json = serde_json::to_value(record).unwrap_or(Value::Null);
                let _ = writeln!(out, "{}", record_line(&json, &view.columns, is_expanded));
            }
            DisplayRow::Detail(marker) => match detail(&marker.parent_id) {
                Some(detail_view) => out.push_str(&detail_panel(&detail_view)),
                None => {
                    let _ = writeln!(out, "{}(no detail for {})", DETAIL_INDENT, marker.parent_id);
                }
            },
        }
    }

    if view.loading {
        let _ = writeln!(out, "loading…");
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "{}", error.message);
    }
    let _ = writeln!(out, "{}", pager(&view.pagination, view.total_count));
    out
}

/// Renders one detail panel, indented under its master row.
pub fn detail_panel(view: &DetailView) -> String {
    let mut out = String::new();
    let tabs = view
        .tab_labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            if i == view.active_tab {
                format!("[{}]", label)
            } else {
                format!(" {} ", label)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "{}{}", DETAIL_INDENT, tabs);

    if let Some(error) = &view.error {
        let _ = writeln!(out, "{}{}", DETAIL_INDENT, error.message);
    }
    if view.rows.is_empty() && !view.loading {
        let _ = writeln!(out, "{}(no records)", DETAIL_INDENT);
    } else {
        let _ = writeln!(out, "{}{}", DETAIL_INDENT, header(&view.columns));
        for record in &view.rows {
            let _ = writeln!(out, "{}{}", DETAIL_INDENT, record_line(record, &view.columns, None));
        }
    }
    if view.loading {
        let _ = writeln!(out, "{}loading…", DETAIL_INDENT);
    }
    let _ = writeln!(out, "{}{}", DETAIL_INDENT, pager(&view.pagination, view.total_count));
    out
}
