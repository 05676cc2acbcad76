use crate::entry::{Entry, EntryInput, EntryOutput, EntryState, Purpose};
use crate::help::Help;
use crate::table::{DayWindow, RowFormat, Timesheet};
use crate::theme::BASE_STYLE;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::Rect,
    widgets::{StatefulWidget, Widget},
    Terminal,
};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::time::Instant;
use time::{Date, Time};
use zeitblatt::format::{Formatter, Template};
use zeitblatt::holidays::Classifier;
use zeitblatt::store::KeyValueStore;
use zeitblatt::worktime::{load, Endpoint, Interval, SaveQueue, WorkTime};

#[derive(Clone, Debug)]
pub(crate) struct App<S> {
    days: DayWindow,
    classifier: Classifier,
    formatter: Formatter,
    rows: RowFormat,
    jump_template: Template,
    time_template: Template,
    store: S,
    queue: SaveQueue,
    state: AppState,
    // Days whose stored value failed to decode and has been logged
    undecodable: BTreeSet<Date>,
}

impl<S: KeyValueStore> App<S> {
    pub(crate) fn new(
        days: DayWindow,
        classifier: Classifier,
        formatter: Formatter,
        store: S,
        queue: SaveQueue,
    ) -> App<S> {
        App {
            days,
            classifier,
            formatter,
            rows: RowFormat::new(formatter),
            jump_template: Template::new("Y4-M2-D2"),
            time_template: Template::new("h2:m2"),
            store,
            queue,
            state: AppState::Table,
            undecodable: BTreeSet::new(),
        }
    }

    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> anyhow::Result<()> {
        while !self.quitting() {
            self.draw(&mut terminal)?;
            if let Some(event) = self.next_event()? {
                self.handle_event(&event, Instant::now())?;
            }
            if self.queue.save_due(&mut self.store, Instant::now()).is_err() {
                self.beep()?;
            }
        }
        let saved = self
            .queue
            .save_all(&mut self.store)
            .context("failed to save work times")?;
        tracing::info!(saved, "quitting");
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    // Blocks until input arrives, or until the next pending save is due
    fn next_event(&self) -> io::Result<Option<Event>> {
        if let Some(deadline) = self.queue.next_deadline() {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if !event::poll(timeout)? {
                return Ok(None);
            }
        }
        event::read().map(Some)
    }

    fn handle_event(&mut self, event: &Event, now: Instant) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Event::Mouse(MouseEvent { kind, .. }) = *event {
            if !self.handle_mouse(kind) {
                self.beep()?;
            }
        } else if let Some(KeyEvent {
            code, modifiers, ..
        }) = event.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code, now) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the wheel was turned past the end of time
    fn handle_mouse(&mut self, kind: MouseEventKind) -> bool {
        if self.state != AppState::Table {
            return true;
        }
        match kind {
            MouseEventKind::ScrollDown => self.days.scroll(1).is_ok(),
            MouseEventKind::ScrollUp => self.days.scroll(-1).is_ok(),
            _ => true,
        }
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode, now: Instant) -> bool {
        match &mut self.state {
            AppState::Table => match key {
                KeyCode::Char('j') | KeyCode::Down => self.days.cursor_forwards().is_ok(),
                KeyCode::Char('k') | KeyCode::Up => self.days.cursor_backwards().is_ok(),
                KeyCode::Char('z') | KeyCode::PageDown => self.days.one_page_forwards().is_ok(),
                KeyCode::Char('w') | KeyCode::PageUp => self.days.one_page_backwards().is_ok(),
                KeyCode::Char('0') | KeyCode::Home => {
                    self.days.jump_to_today();
                    true
                }
                KeyCode::Char('g') => {
                    self.state = AppState::Entering(EntryState::new(Purpose::JumpTo));
                    true
                }
                KeyCode::Char('s') => {
                    self.state =
                        AppState::Entering(EntryState::new(Purpose::Edit(Endpoint::Start)));
                    true
                }
                KeyCode::Char('e') => {
                    self.state = AppState::Entering(EntryState::new(Purpose::Edit(Endpoint::End)));
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Table;
                true
            }
            AppState::Entering(state) => {
                if matches!(key, KeyCode::Char('q') | KeyCode::Esc) {
                    self.state = AppState::Table;
                    return true;
                }
                let input = match key {
                    KeyCode::Char(c) => c
                        .to_digit(10)
                        .and_then(|d| u8::try_from(d).ok())
                        .map(EntryInput::Digit),
                    KeyCode::Backspace | KeyCode::Delete => Some(EntryInput::Backspace),
                    KeyCode::Enter => Some(EntryInput::Enter),
                    _ => None,
                };
                let Some(input) = input else {
                    return false;
                };
                match state.handle_input(input) {
                    EntryOutput::Ok => true,
                    EntryOutput::Invalid => false,
                    EntryOutput::Submit(text) => {
                        let purpose = state.purpose();
                        self.submit(purpose, &text, now)
                    }
                }
            }
            AppState::Quitting => false,
        }
    }

    // Returns `false` if the entered text is not a valid date or time, in
    // which case the popup stays open for correction
    fn submit(&mut self, purpose: Purpose, text: &str, now: Instant) -> bool {
        match purpose {
            Purpose::JumpTo => match self.formatter.parse(text, &self.jump_template).to_date() {
                Ok(date) => {
                    self.days.jump_to_date(date);
                    self.state = AppState::Table;
                    true
                }
                Err(e) => {
                    tracing::debug!(input = text, error = %e, "rejected date");
                    false
                }
            },
            Purpose::Edit(which) => match self.formatter.parse(text, &self.time_template).to_time()
            {
                Ok(time) => {
                    self.edit(which, time, now);
                    self.state = AppState::Table;
                    true
                }
                Err(e) => {
                    tracing::debug!(input = text, error = %e, "rejected time");
                    false
                }
            },
        }
    }

    /// Set the start or end of the selected day.  A day without hours gets
    /// an empty span at the entered time first.
    fn edit(&mut self, which: Endpoint, time: Time, now: Instant) {
        let date = self.days.cursor();
        let is_workday = self.classifier.day_info(date).kind.is_workday;
        let current = self.work_time(date, is_workday).unwrap_or_else(|| {
            let at = date.with_time(time);
            WorkTime::new(Interval(at, at), Vec::new())
        });
        let edited = current.patch_start_or_end(which, time, date);
        tracing::debug!(%date, ?which, %time, "edited work time");
        self.queue.edit(edited, now);
    }

    /// The hours to show for `date`: an unsaved edit, else what is stored,
    /// else the schedule's default on workdays
    fn work_time(&mut self, date: Date, is_workday: bool) -> Option<WorkTime> {
        if let Some(wt) = self.queue.pending(date) {
            return Some(wt.clone());
        }
        match load(&self.store, date) {
            Ok(Some(wt)) => return Some(wt),
            Ok(None) => (),
            Err(e) => {
                if self.undecodable.insert(date) {
                    tracing::warn!(%date, error = %e, "ignoring stored work time");
                }
            }
        }
        if is_workday {
            self.classifier.schedule().work_time_for(date)
        } else {
            None
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }
}

impl<S: KeyValueStore> Widget for &mut App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let days = self.days.ensure_rows(Timesheet::rows_for_lines(area.height));
        let rows = days
            .into_iter()
            .map(|date| {
                let is_workday = self.classifier.day_info(date).kind.is_workday;
                let work_time = self.work_time(date, is_workday);
                let info = self.classifier.day_info(date);
                let unsaved = self.queue.pending(date).is_some();
                self.rows.row(&info, work_time.as_ref(), unsaved)
            })
            .collect::<Vec<_>>();
        Timesheet::new(&rows, self.days.today(), self.days.cursor()).render(area, buf);
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        } else if let AppState::Entering(ref mut state) = self.state {
            Entry.render(area, buf, state);
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum AppState {
    Table,
    Helping,
    Entering(EntryState),
    Quitting,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use time::macros::{date, datetime};
    use zeitblatt::holidays::{Birthday, HolidayTable};
    use zeitblatt::store::MemoryStore;
    use zeitblatt::worktime::{format_duration, persist, WeekdaySchedule};

    fn app(today: Date) -> App<MemoryStore> {
        App::new(
            DayWindow::new(today),
            Classifier::new(
                HolidayTable::austria(),
                vec![Birthday::new("Anna", date!(1990 - 12 - 26))],
                WeekdaySchedule::default(),
            ),
            Formatter::default(),
            MemoryStore::new(),
            SaveQueue::new(Duration::from_secs(1)),
        )
    }

    fn type_keys(app: &mut App<MemoryStore>, keys: &str, now: Instant) {
        for c in keys.chars() {
            assert!(app.handle_key(KeyCode::Char(c), now), "key {c:?} rejected");
        }
    }

    fn lines(buf: &Buffer) -> Vec<String> {
        buf.content()
            .chunks(usize::from(buf.area.width))
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect()
    }

    #[test]
    fn test_christmas_week() {
        let mut app = app(date!(2024 - 12 - 23));
        let area = Rect::new(0, 0, 80, 8);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        assert_eq!(
            lines(&buffer),
            [
                "  Datum           Beginn Ende   Pausen        Dauer    A W  Feiertage, Geburtsta",
                "────────────────────────────────────────────────────────────────────────────────",
                "▶ Mo. 2024-12-23  08:00  16:30  12:00-12:30   08:00h   o                        ",
                "  Di. 2024-12-24                                            Heiliger Abend      ",
                "  Mi. 2024-12-25                                            Christtag           ",
                "  Do. 2024-12-26                                            Stefanitag, Anna (34",
                "  Fr. 2024-12-27  08:00  16:30  12:00-12:30   08:00h   o                        ",
                "  Sa. 2024-12-28                                         o                      ",
            ]
        );
    }

    #[test]
    fn test_navigation() {
        let mut app = app(date!(2024 - 12 - 23));
        let now = Instant::now();
        let mut buffer = Buffer::empty(Rect::new(0, 0, 80, 5));
        app.render(buffer.area, &mut buffer);
        assert!(app.handle_key(KeyCode::Char('j'), now));
        assert!(app.handle_key(KeyCode::Down, now));
        assert_eq!(app.days.cursor(), date!(2024 - 12 - 25));
        assert!(app.handle_key(KeyCode::PageDown, now));
        assert_eq!(app.days.cursor(), date!(2024 - 12 - 28));
        assert!(app.handle_key(KeyCode::Home, now));
        assert_eq!(app.days.cursor(), date!(2024 - 12 - 23));
        assert!(app.handle_mouse(MouseEventKind::ScrollDown));
        assert_eq!(app.days.cursor(), date!(2024 - 12 - 24));
        assert!(!app.handle_key(KeyCode::Char('x'), now));
        assert!(app.handle_key(KeyCode::Char('?'), now));
        assert_eq!(app.state, AppState::Helping);
        assert!(app.handle_key(KeyCode::Char('x'), now));
        assert_eq!(app.state, AppState::Table);
        assert!(app.handle_key(KeyCode::Char('q'), now));
        assert!(app.quitting());
    }

    #[test]
    fn test_jump_to_date() {
        let mut app = app(date!(2024 - 12 - 23));
        let now = Instant::now();
        type_keys(&mut app, "g20250230", now);
        assert!(!app.handle_key(KeyCode::Enter, now));
        assert!(matches!(app.state, AppState::Entering(_)));
        assert!(app.handle_key(KeyCode::Backspace, now));
        assert!(app.handle_key(KeyCode::Backspace, now));
        type_keys(&mut app, "14", now);
        assert!(app.handle_key(KeyCode::Enter, now));
        assert_eq!(app.state, AppState::Table);
        assert_eq!(app.days.cursor(), date!(2025 - 02 - 14));
    }

    #[test]
    fn test_edit_start_is_debounced() {
        let mut app = app(date!(2024 - 12 - 23));
        let t0 = Instant::now();
        type_keys(&mut app, "s0730", t0);
        assert!(app.handle_key(KeyCode::Enter, t0));
        let wt = app.queue.pending(date!(2024 - 12 - 23)).unwrap();
        assert_eq!(wt.start(), datetime!(2024-12-23 07:30));
        assert_eq!(wt.end(), datetime!(2024-12-23 16:30));
        assert_eq!(format_duration(wt.duration()), "08:30h");
        assert_eq!(app.queue.save_due(&mut app.store, t0).unwrap(), 0);
        assert_eq!(load(&app.store, date!(2024 - 12 - 23)).unwrap(), None);

        let t1 = t0 + Duration::from_millis(500);
        type_keys(&mut app, "e1700", t1);
        assert!(app.handle_key(KeyCode::Enter, t1));
        assert_eq!(app.queue.save_due(&mut app.store, t0 + Duration::from_secs(1)).unwrap(), 0);
        assert_eq!(app.queue.save_due(&mut app.store, t1 + Duration::from_secs(1)).unwrap(), 1);
        let saved = load(&app.store, date!(2024 - 12 - 23)).unwrap().unwrap();
        assert_eq!(saved.start(), datetime!(2024-12-23 07:30));
        assert_eq!(saved.end(), datetime!(2024-12-23 17:00));
        assert!(app.queue.is_empty());
    }

    #[test]
    fn test_edit_day_off() {
        let mut app = app(date!(2024 - 12 - 28));
        let now = Instant::now();
        type_keys(&mut app, "e1200", now);
        assert!(app.handle_key(KeyCode::Enter, now));
        type_keys(&mut app, "s0900", now);
        assert!(app.handle_key(KeyCode::Enter, now));
        let wt = app.queue.pending(date!(2024 - 12 - 28)).unwrap();
        assert_eq!(wt.start(), datetime!(2024-12-28 09:00));
        assert_eq!(wt.end(), datetime!(2024-12-28 12:00));
        assert!(wt.breaks().is_empty());
        assert_eq!(format_duration(wt.duration()), "03:00h");
    }

    #[test]
    fn test_invalid_time_keeps_popup_open() {
        let mut app = app(date!(2024 - 12 - 23));
        let now = Instant::now();
        type_keys(&mut app, "s2599", now);
        assert!(!app.handle_key(KeyCode::Enter, now));
        assert!(matches!(app.state, AppState::Entering(_)));
        assert!(app.handle_key(KeyCode::Esc, now));
        assert_eq!(app.state, AppState::Table);
        assert!(app.queue.is_empty());
    }

    #[test]
    fn test_stored_hours_win_over_schedule() {
        let mut app = app(date!(2024 - 12 - 23));
        let stored = WorkTime::new(
            Interval(datetime!(2024-12-23 06:00), datetime!(2024-12-23 10:00)),
            Vec::new(),
        );
        persist(&mut app.store, &stored).unwrap();
        assert_eq!(app.work_time(date!(2024 - 12 - 23), true), Some(stored));
        app.store
            .set("2024-12-27", String::from("not json"))
            .unwrap();
        let scheduled = app.classifier.schedule().work_time_for(date!(2024 - 12 - 27));
        assert_eq!(app.work_time(date!(2024 - 12 - 27), true), scheduled);
        assert!(app.undecodable.contains(&date!(2024 - 12 - 27)));
        assert_eq!(app.work_time(date!(2024 - 12 - 27), true), scheduled);
        assert_eq!(app.undecodable.len(), 1);
        assert_eq!(app.work_time(date!(2024 - 12 - 28), false), None);
    }

    #[test]
    fn test_unsaved_edits_are_flushed() {
        let mut app = app(date!(2024 - 12 - 23));
        let now = Instant::now();
        type_keys(&mut app, "e1500", now);
        assert!(app.handle_key(KeyCode::Enter, now));
        assert_eq!(app.queue.save_all(&mut app.store).unwrap(), 1);
        let saved = load(&app.store, date!(2024 - 12 - 23)).unwrap().unwrap();
        assert_eq!(saved.end(), datetime!(2024-12-23 15:00));
    }
}
