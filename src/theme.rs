use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const HEADER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const TODAY_STYLE: Style = Style::new().bg(Color::Rgb(0x33, 0x44, 0x33));

pub(crate) const CURSOR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

pub(crate) const HOLIDAY_STYLE: Style = Style::new()
    .fg(Color::LightGreen)
    .add_modifier(Modifier::BOLD);

pub(crate) const WEEKEND_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Hours that have been edited but not yet written to the store
pub(crate) const UNSAVED_STYLE: Style = Style::new().add_modifier(Modifier::ITALIC);

pub(crate) const NEGATIVE_STYLE: Style = Style::new().fg(Color::LightRed);

pub(crate) mod entry {
    use super::*;

    pub(crate) const UNFILLED_CELL_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

    pub(crate) const READY_ENTER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::UNDERLINED);
}
