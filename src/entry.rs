use crate::theme::{
    entry::{READY_ENTER_STYLE, UNFILLED_CELL_STYLE},
    BASE_STYLE,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Margin, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Clear, StatefulWidget, Widget},
};
use zeitblatt::worktime::Endpoint;

const OUTER_WIDTH: u16 = 17;
const OUTER_HEIGHT: u16 = 8;

/// Digit-entry popup for the jump-to-date prompt and for editing times
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Entry;

impl StatefulWidget for Entry {
    type State = EntryState;

    /*
     * .................
     * .┌─ Springe… ──┐.
     * .│             │.
     * .│ YYYY-MM-DD  │.
     * .│             │.
     * .│   [ENTER]   │.
     * .└─────────────┘.
     * .................
     */

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [outer_area] = Layout::horizontal([OUTER_WIDTH])
            .flex(Flex::Center)
            .areas(area);
        let [outer_area] = Layout::vertical([OUTER_HEIGHT])
            .flex(Flex::Center)
            .areas(outer_area);
        Clear.render(outer_area, buf);
        Block::new().style(BASE_STYLE).render(outer_area, buf);
        let block_area = outer_area.inner(Margin::new(1, 1));
        Block::bordered()
            .title(state.purpose.title())
            .title_alignment(Alignment::Center)
            .render(block_area, buf);
        let text_area = block_area.inner(Margin::new(1, 1));
        state.to_text().render(text_area, buf);
    }
}

/// What the entered value will be used for
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Purpose {
    JumpTo,
    Edit(Endpoint),
}

impl Purpose {
    fn title(self) -> &'static str {
        match self {
            Purpose::JumpTo => " Springe… ",
            Purpose::Edit(Endpoint::Start) => " Beginn ",
            Purpose::Edit(Endpoint::End) => " Ende ",
        }
    }

    /// The placeholder shown while nothing is entered.  Letters mark digit
    /// cells; everything else is printed as is.
    fn pattern(self) -> &'static str {
        match self {
            Purpose::JumpTo => "YYYY-MM-DD",
            Purpose::Edit(_) => "hh:mm",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Cell {
    Literal(char),
    Digit { placeholder: char, value: Option<u8> },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct EntryState {
    purpose: Purpose,
    cells: Vec<Cell>,
    // Number of digits entered so far
    pos: usize,
}

impl EntryState {
    pub(crate) fn new(purpose: Purpose) -> EntryState {
        let cells = purpose
            .pattern()
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphabetic() {
                    Cell::Digit {
                        placeholder: ch,
                        value: None,
                    }
                } else {
                    Cell::Literal(ch)
                }
            })
            .collect();
        EntryState {
            purpose,
            cells,
            pos: 0,
        }
    }

    pub(crate) fn purpose(&self) -> Purpose {
        self.purpose
    }

    fn capacity(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Digit { .. }))
            .count()
    }

    fn digit_mut(&mut self, index: usize) -> Option<&mut Option<u8>> {
        self.cells
            .iter_mut()
            .filter_map(|c| match c {
                Cell::Digit { value, .. } => Some(value),
                Cell::Literal(_) => None,
            })
            .nth(index)
    }

    fn to_text(&self) -> Text<'static> {
        Text::from_iter([
            Line::styled("", BASE_STYLE),
            self.to_line(),
            Line::styled("", BASE_STYLE),
            // Style a span and convert it to a line rather than creating a
            // styled line directly so that only the "[ENTER]" text and not any
            // of its centering padding will be underlined:
            Line::from(Span::styled(
                "[ENTER]",
                if self.pos == self.capacity() {
                    READY_ENTER_STYLE
                } else {
                    BASE_STYLE
                },
            )),
        ])
        .centered()
    }

    fn to_line(&self) -> Line<'static> {
        Line::from_iter(self.cells.iter().map(|cell| match *cell {
            Cell::Literal(ch) => Span::styled(String::from(ch), BASE_STYLE),
            Cell::Digit {
                value: Some(d), ..
            } => Span::styled(d.to_string(), BASE_STYLE),
            Cell::Digit {
                placeholder,
                value: None,
            } => Span::styled(String::from(placeholder), UNFILLED_CELL_STYLE),
        }))
    }

    /// The entered text with every digit cell filled in, or `None` if some
    /// are still empty
    fn entered(&self) -> Option<String> {
        self.cells
            .iter()
            .map(|cell| match *cell {
                Cell::Literal(ch) => Some(ch),
                Cell::Digit { value, .. } => value.map(|d| char::from(b'0' + d)),
            })
            .collect()
    }

    pub(crate) fn handle_input(&mut self, input: EntryInput) -> EntryOutput {
        match input {
            EntryInput::Digit(d) if d < 10 && self.pos < self.capacity() => {
                let pos = self.pos;
                if let Some(slot) = self.digit_mut(pos) {
                    *slot = Some(d);
                }
                self.pos += 1;
                EntryOutput::Ok
            }
            EntryInput::Backspace if self.pos > 0 => {
                self.pos -= 1;
                let pos = self.pos;
                if let Some(slot) = self.digit_mut(pos) {
                    *slot = None;
                }
                EntryOutput::Ok
            }
            EntryInput::Enter => match self.entered() {
                Some(text) => EntryOutput::Submit(text),
                None => EntryOutput::Invalid,
            },
            _ => EntryOutput::Invalid,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum EntryInput {
    Digit(u8),
    Backspace,
    Enter,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum EntryOutput {
    Ok,
    Invalid,
    Submit(String),
}
