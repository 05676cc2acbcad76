use super::row::DayRow;
use crate::theme::{
    CURSOR_STYLE, HEADER_STYLE, HOLIDAY_STYLE, NEGATIVE_STYLE, TODAY_STYLE, UNSAVED_STYLE,
    WEEKEND_STYLE,
};
use ratatui::{prelude::*, widgets::*};
use std::num::NonZeroUsize;
use time::Date;

/// Number of lines taken up by the header and its rule
const HEADER_LINES: u16 = 2;

const CURSOR_X: u16 = 0;
const DATE_X: u16 = 2;
const START_X: u16 = 18;
const END_X: u16 = 25;
const BREAKS_X: u16 = 32;
const DURATION_X: u16 = 46;
const WORKDAY_X: u16 = 55;
const WEEKEND_X: u16 = 57;
const NOTES_X: u16 = 60;

const HEADINGS: [(u16, &str); 8] = [
    (DATE_X, "Datum"),
    (START_X, "Beginn"),
    (END_X, "Ende"),
    (BREAKS_X, "Pausen"),
    (DURATION_X, "Dauer"),
    (WORKDAY_X, "A"),
    (WEEKEND_X, "W"),
    (NOTES_X, "Feiertage, Geburtstage"),
];

const ACS_HLINE: char = '─';
const CURSOR_MARK: char = '▶';
const FLAG_MARK: char = 'o';

/// One line per day: date, hours, and what is special about the day
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Timesheet<'a> {
    rows: &'a [DayRow],
    today: Date,
    cursor: Date,
}

impl<'a> Timesheet<'a> {
    pub(crate) fn new(rows: &'a [DayRow], today: Date, cursor: Date) -> Timesheet<'a> {
        Timesheet {
            rows,
            today,
            cursor,
        }
    }

    /// How many days fit in an area `lines` lines high
    pub(crate) fn rows_for_lines(lines: u16) -> NonZeroUsize {
        NonZeroUsize::new(lines.saturating_sub(HEADER_LINES).into()).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Widget for Timesheet<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut canvas = BufferCanvas::new(area, buf);
        canvas.draw_header();
        for (i, row) in std::iter::zip(0u16.., self.rows) {
            let y = i.saturating_add(HEADER_LINES);
            if row.date == self.today {
                canvas.style_line(y, TODAY_STYLE);
            }
            if row.date == self.cursor {
                canvas.style_line(y, CURSOR_STYLE);
                canvas.mvaddch(y, CURSOR_X, CURSOR_MARK);
            }
            canvas.draw_row(y, row);
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn draw_header(&mut self) {
        for (x, heading) in HEADINGS {
            self.mvprint(0, x, heading, Some(HEADER_STYLE));
        }
        self.hline(1, 0, ACS_HLINE, self.area.width);
    }

    fn draw_row(&mut self, y: u16, row: &DayRow) {
        let label_style = if row.is_holiday {
            Some(HOLIDAY_STYLE)
        } else if row.kind.is_weekend {
            Some(WEEKEND_STYLE)
        } else {
            None
        };
        self.mvprint(y, DATE_X, &row.label, label_style);
        if let Some(hours) = &row.hours {
            self.mvprint(y, START_X, &hours.start, None);
            self.mvprint(y, END_X, &hours.end, None);
            self.mvprint(y, BREAKS_X, &hours.breaks, None);
            let duration_style = match (hours.negative, row.unsaved) {
                (true, true) => Some(NEGATIVE_STYLE.patch(UNSAVED_STYLE)),
                (true, false) => Some(NEGATIVE_STYLE),
                (false, true) => Some(UNSAVED_STYLE),
                (false, false) => None,
            };
            self.mvprint(y, DURATION_X, &hours.duration, duration_style);
        }
        if row.kind.is_workday {
            self.mvaddch(y, WORKDAY_X, FLAG_MARK);
        }
        if row.kind.is_weekend {
            self.mvaddch(y, WEEKEND_X, FLAG_MARK);
        }
        self.mvprint(y, NOTES_X, &row.notes, row.is_holiday.then_some(HOLIDAY_STYLE));
    }

    fn style_line(&mut self, y: u16, style: Style) {
        if y < self.area.height {
            self.buf.set_style(
                Rect {
                    x: self.area.x,
                    y: y + self.area.y,
                    width: self.area.width,
                    height: 1,
                },
                style,
            );
        }
    }

    fn mvaddch(&mut self, y: u16, x: u16, ch: char) {
        if y < self.area.height && x < self.area.width {
            self.buf[(x + self.area.x, y + self.area.y)].set_char(ch);
        }
    }

    // Styles are patched onto the cells, so the today and cursor highlights
    // survive.
    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style.unwrap_or_default());
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // Using a Paragraph lets us truncate text that extends beyond the
            // table's area, though we need to be sure that the Rect passed to
            // the Paragraph is entirely within the frame lest a panic result.
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }

    fn hline(&mut self, y: u16, x: u16, ch: char, length: u16) {
        self.mvprint(y, x, String::from(ch).repeat(length.into()), None);
    }
}
