use std::iter::successors;
use std::num::NonZeroUsize;
use time::Date;
use zeitblatt::calendar::{add_days, OutOfTimeError};

/// The run of consecutive days currently on screen, plus the selected day
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct DayWindow {
    today: Date,
    start: Date,
    cursor: Date,
    len: NonZeroUsize,
}

impl DayWindow {
    pub(crate) fn new(today: Date) -> Self {
        DayWindow {
            today,
            start: today,
            cursor: today,
            len: NonZeroUsize::MIN,
        }
    }

    pub(crate) fn start_date(mut self, date: Date) -> Self {
        self.start = date;
        self.cursor = date;
        self
    }

    pub(crate) fn today(&self) -> Date {
        self.today
    }

    pub(crate) fn cursor(&self) -> Date {
        self.cursor
    }

    /// Resize the window to `len` days and return the days in it
    pub(crate) fn ensure_rows(&mut self, len: NonZeroUsize) -> Vec<Date> {
        self.len = len;
        if add_days(self.start, self.span()).is_err() {
            // The terminal was heightened while at the end of time, so
            // "scroll" the table down to keep it full.
            self.start = add_days(Date::MAX, -self.span()).unwrap_or(Date::MIN);
        }
        self.follow_cursor();
        self.days().collect()
    }

    pub(crate) fn days(&self) -> impl Iterator<Item = Date> {
        successors(Some(self.start), |&d| d.next_day()).take(self.len.get())
    }

    pub(crate) fn cursor_forwards(&mut self) -> Result<(), OutOfTimeError> {
        self.cursor = self.cursor.next_day().ok_or(OutOfTimeError)?;
        self.follow_cursor();
        Ok(())
    }

    pub(crate) fn cursor_backwards(&mut self) -> Result<(), OutOfTimeError> {
        self.cursor = self.cursor.previous_day().ok_or(OutOfTimeError)?;
        self.follow_cursor();
        Ok(())
    }

    /// Move the view by `days` days, keeping the cursor on the same line
    pub(crate) fn scroll(&mut self, days: i64) -> Result<(), OutOfTimeError> {
        let start = add_days(self.start, days)?;
        add_days(start, self.span())?;
        self.cursor = add_days(self.cursor, days)?;
        self.start = start;
        Ok(())
    }

    pub(crate) fn one_page_forwards(&mut self) -> Result<(), OutOfTimeError> {
        self.scroll(self.span() + 1)
    }

    pub(crate) fn one_page_backwards(&mut self) -> Result<(), OutOfTimeError> {
        self.scroll(-self.span() - 1)
    }

    pub(crate) fn jump_to_today(&mut self) {
        self.jump_to_date(self.today);
    }

    pub(crate) fn jump_to_date(&mut self, date: Date) {
        self.start = date;
        self.cursor = date;
        if add_days(self.start, self.span()).is_err() {
            self.start = add_days(Date::MAX, -self.span()).unwrap_or(Date::MIN);
        }
    }

    // Number of days between the first and last day shown
    fn span(&self) -> i64 {
        i64::try_from(self.len.get() - 1).unwrap_or(i64::MAX)
    }

    fn follow_cursor(&mut self) {
        if self.cursor < self.start {
            self.start = self.cursor;
        } else if let Ok(last) = add_days(self.start, self.span()) {
            if self.cursor > last {
                self.start = add_days(self.cursor, -self.span()).unwrap_or(Date::MIN);
            }
        }
    }
}
