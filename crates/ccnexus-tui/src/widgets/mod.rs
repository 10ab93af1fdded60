//! Reusable widgets: modal dialogs, text fields and usage bars.

pub mod endpoint_form;
pub mod port_dialog;
pub mod share_bar;
pub mod text_field;

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    widgets::{Block, BorderType, Borders, Clear},
};

use crate::theme;

/// A `width`×`height` rect centered in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

/// Clear `area` and draw a rounded modal frame; returns the inner area.
pub fn modal(frame: &mut Frame, area: Rect, title: &str, border: Style) -> Rect {
    frame.render_widget(Clear, area);
    let mut block = Block::default();
    if !title.is_empty() {
        block = block.title(format!(" {title} "));
    }
    let block = block
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}
