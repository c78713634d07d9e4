use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let breadcrumb = model.nav.breadcrumb();
    let location = if breadcrumb.is_empty() {
        "databases".to_string()
    } else {
        breadcrumb
    };
    let modified_indicator = if model.nav.has_unsaved_changes() {
        " [modified]"
    } else {
        ""
    };
    let edit_indicator = if model.is_editing() { " [edit]" } else { "" };

    let status = format!(
        " {}  {}{}{}  ?:help",
        model.source_label, location, modified_indicator, edit_indicator
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
