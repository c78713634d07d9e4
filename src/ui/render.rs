use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::Model;
use crate::nav::{Column, ColumnItem, EditView};

use super::{overlays, status};

/// Narrowest a column gets before columns to the left scroll out of view.
pub const MIN_COLUMN_WIDTH: u16 = 24;

/// First visible column and how many columns fit in `width`.
///
/// Prefers the deepest columns but always keeps `focus` on screen.
pub fn column_window(count: usize, focus: usize, width: u16) -> (usize, usize) {
    let fit = usize::from(width / MIN_COLUMN_WIDTH).max(1);
    let shown = count.min(fit);
    let start = (count - shown).min(focus);
    (start, shown)
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let toast_rows = u16::from(model.active_toast().is_some());
    let [main, status_area, toast_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(toast_rows),
    ])
    .areas(area);

    render_columns(model, frame, main);
    status::render_status_bar(model, frame, status_area);
    status::render_toast_bar(model, frame, toast_area);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_columns(model: &mut Model, frame: &mut Frame, area: Rect) {
    let rows = usize::from(area.height.saturating_sub(2));
    let columns = model.nav.columns(rows);
    if columns.is_empty() {
        return;
    }
    let (start, shown) = column_window(columns.len(), model.focus, area.width);
    #[allow(clippy::cast_possible_truncation)]
    let constraints = vec![Constraint::Ratio(1, shown as u32); shown];
    let areas = Layout::horizontal(constraints).split(area);

    for (offset, column) in columns.iter().skip(start).take(shown).enumerate() {
        let index = start + offset;
        render_column(column, index == model.focus, frame, areas[offset]);
    }
}

fn render_column(column: &Column, focused: bool, frame: &mut Frame, area: Rect) {
    let title = if column.modified {
        format!(" {} [modified] ", column.title)
    } else {
        format!(" {} ", column.title)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });
    let inner = block.inner(area);
    let width = usize::from(inner.width);

    let mut lines: Vec<Line> = Vec::with_capacity(column.items.len() + 1);
    for (row, item) in column.items.iter().enumerate() {
        match &item.editing {
            Some(edit) => {
                let (line, cursor_x) = edit_line(item, edit, width);
                lines.push(line);
                #[allow(clippy::cast_possible_truncation)]
                let position = Position::new(inner.x + cursor_x as u16, inner.y + row as u16);
                if inner.contains(position) {
                    frame.set_cursor_position(position);
                }
            }
            None => lines.push(item_line(item, width, focused)),
        }
    }
    if let Some(err) = &column.error {
        lines.push(Line::styled(
            clip(&format!("! {err}"), width),
            Style::default().fg(Color::Red),
        ));
    } else if lines.is_empty() {
        lines.push(Line::styled(
            "(empty)",
            Style::default().fg(Color::Indexed(245)),
        ));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn marker(item: &ColumnItem) -> &'static str {
    if item.activated { "> " } else { "  " }
}

fn item_line(item: &ColumnItem, width: usize, focused: bool) -> Line<'static> {
    let mut remaining = width;
    let mut spans = Vec::with_capacity(3);
    for (text, style) in [
        (marker(item).to_string(), Style::default()),
        (
            item.key.as_ref().map(|key| format!("{key}: ")).unwrap_or_default(),
            Style::default(),
        ),
        (
            item.text.clone(),
            if item.key.is_some() {
                Style::default().add_modifier(Modifier::DIM)
            } else {
                Style::default()
            },
        ),
    ] {
        let clipped = clip(&text, remaining);
        remaining -= clipped.width();
        spans.push(Span::styled(clipped, style));
    }

    let line = Line::from(spans);
    match (item.selected, focused) {
        (true, true) => line.reversed(),
        (true, false) => line.bold(),
        _ => line,
    }
}

/// Line for the item being edited and the cursor column within it.
///
/// The edit text scrolls horizontally so the cursor stays visible.
fn edit_line(item: &ColumnItem, edit: &EditView, width: usize) -> (Line<'static>, usize) {
    let prefix = format!(
        "{}{}",
        marker(item),
        item.key.as_ref().map(|key| format!("{key}: ")).unwrap_or_default()
    );
    let prefix = clip(&prefix, width.saturating_sub(1));
    let prefix_width = prefix.width();
    let room = width.saturating_sub(prefix_width + 1).max(1);

    let before_width = edit.before_cursor.width();
    let skip_width = before_width.saturating_sub(room);
    let mut skipped = 0;
    let visible: String = edit
        .text
        .chars()
        .skip_while(|ch| {
            if skipped < skip_width {
                skipped += ch.width().unwrap_or(0);
                true
            } else {
                false
            }
        })
        .collect();
    let cursor_x = prefix_width + before_width - skipped;

    let line = Line::from(vec![
        Span::raw(prefix),
        Span::styled(
            clip(&visible, width.saturating_sub(prefix_width)),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED),
        ),
    ]);
    (line, cursor_x)
}

/// Longest prefix of `text` that fits in `width` display cells.
fn clip(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut used = 0;
    text.chars()
        .take_while(|ch| {
            used += ch.width().unwrap_or(0);
            used <= width
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_window_prefers_deepest_columns() {
        assert_eq!(column_window(2, 0, 120), (0, 2));
        assert_eq!(column_window(6, 5, 72), (3, 3));
        assert_eq!(column_window(6, 1, 72), (1, 3));
        assert_eq!(column_window(4, 0, 10), (0, 1));
        assert_eq!(column_window(0, 0, 80), (0, 0));
    }

    #[test]
    fn test_clip_respects_wide_chars() {
        assert_eq!(clip("hello", 3), "hel");
        assert_eq!(clip("日本語", 5), "日本");
        assert_eq!(clip("ok", 10), "ok");
    }

    #[test]
    fn test_edit_line_scrolls_to_cursor() {
        let item = ColumnItem {
            index: 0,
            key: Some("k".to_string()),
            text: String::new(),
            selected: true,
            activated: true,
            editing: None,
        };
        let text = "abcdefghijklmnopqrstuvwxyz".to_string();
        let edit = EditView {
            before_cursor: text.clone(),
            text,
        };
        let (line, cursor_x) = edit_line(&item, &edit, 12);
        assert!(cursor_x < 12);
        let rendered: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert!(rendered.starts_with("> k: "));
        assert!(rendered.ends_with('z'));
    }
}
