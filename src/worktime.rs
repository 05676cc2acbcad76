use crate::calendar::{date_key, weekday_index};
use crate::debounce::Debouncer;
use crate::format::pad_number;
use crate::store::{KeyValueStore, StoreError};
use crate::timefmt::{clock, iso_timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;
use time::{macros::time, Date, Duration, PrimitiveDateTime, Time, Weekday};

/// A span of time `[start, end)`.  Serializes as a two-element array of
/// timestamps.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Interval(
    #[serde(with = "iso_timestamp")] pub PrimitiveDateTime,
    #[serde(with = "iso_timestamp")] pub PrimitiveDateTime,
);

impl Interval {
    pub fn start(&self) -> PrimitiveDateTime {
        self.0
    }

    pub fn end(&self) -> PrimitiveDateTime {
        self.1
    }

    /// Signed length; negative if the interval ends before it starts
    pub fn length(&self) -> Duration {
        self.1 - self.0
    }
}

/// The hours logged for one day: an outer working span followed by the
/// breaks taken within it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(into = "Vec<Interval>", try_from = "Vec<Interval>")]
pub struct WorkTime {
    span: Interval,
    breaks: Vec<Interval>,
}

impl WorkTime {
    pub fn new(span: Interval, breaks: Vec<Interval>) -> WorkTime {
        WorkTime { span, breaks }
    }

    pub fn span(&self) -> Interval {
        self.span
    }

    pub fn start(&self) -> PrimitiveDateTime {
        self.span.start()
    }

    pub fn end(&self) -> PrimitiveDateTime {
        self.span.end()
    }

    pub fn breaks(&self) -> &[Interval] {
        &self.breaks
    }

    /// The calendar day the work time is filed under
    pub fn date(&self) -> Date {
        self.start().date()
    }

    /// Time worked: the outer span minus all breaks.  Inconsistent entries
    /// (such as an end before the start) give a negative result rather than
    /// an error.
    pub fn duration(&self) -> Duration {
        self.breaks
            .iter()
            .fold(self.span.length(), |total, b| total - b.length())
    }

    /// Replace the clock time of the start or end of the outer span.  The
    /// changed endpoint is placed on `anchor`, so editing a clock time never
    /// moves the entry to a different day.
    pub fn patch_start_or_end(&self, which: Endpoint, time: Time, anchor: Date) -> WorkTime {
        let at = PrimitiveDateTime::new(anchor, time);
        let span = match which {
            Endpoint::Start => Interval(at, self.span.end()),
            Endpoint::End => Interval(self.span.start(), at),
        };
        WorkTime {
            span,
            breaks: self.breaks.clone(),
        }
    }
}

impl From<WorkTime> for Vec<Interval> {
    fn from(value: WorkTime) -> Vec<Interval> {
        let mut intervals = Vec::with_capacity(value.breaks.len() + 1);
        intervals.push(value.span);
        intervals.extend(value.breaks);
        intervals
    }
}

impl TryFrom<Vec<Interval>> for WorkTime {
    type Error = WorkTimeError;

    fn try_from(value: Vec<Interval>) -> Result<WorkTime, WorkTimeError> {
        let mut iter = value.into_iter();
        let span = iter.next().ok_or(WorkTimeError::Empty)?;
        Ok(WorkTime {
            span,
            breaks: iter.collect(),
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum WorkTimeError {
    #[error("work time has no intervals")]
    Empty,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Endpoint {
    Start,
    End,
}

/// Render a duration as `HH:MMh`.  Negative durations get a leading minus
/// sign in front of the padded absolute value.
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.whole_minutes();
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.unsigned_abs();
    format!(
        "{sign}{}:{}h",
        pad_number(minutes / 60, 2, true),
        pad_number(minutes % 60, 2, true)
    )
}

/// Store `work_time` under the key of its own start date
pub fn persist<S: KeyValueStore + ?Sized>(
    store: &mut S,
    work_time: &WorkTime,
) -> Result<(), StoreError> {
    let key = date_key(work_time.date());
    let value = serde_json::to_string(work_time).map_err(|source| StoreError::Encode {
        key: key.clone(),
        source,
    })?;
    store.set(&key, value)
}

/// Read the work time stored for `date`.  `Ok(None)` means nothing has been
/// saved for that day and the weekday's default applies.
pub fn load<S: KeyValueStore + ?Sized>(
    store: &S,
    date: Date,
) -> Result<Option<WorkTime>, StoreError> {
    let key = date_key(date);
    match store.get(&key)? {
        Some(value) => serde_json::from_str(&value)
            .map(Some)
            .map_err(|source| StoreError::Decode { key, source }),
        None => Ok(None),
    }
}

/// A pair of clock times, `["HH:MM", "HH:MM"]` in config files
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
pub struct ClockInterval(
    #[serde(with = "clock")] pub Time,
    #[serde(with = "clock")] pub Time,
);

impl ClockInterval {
    pub fn on(&self, date: Date) -> Interval {
        Interval(
            PrimitiveDateTime::new(date, self.0),
            PrimitiveDateTime::new(date, self.1),
        )
    }
}

/// Default hours for one weekday, not yet tied to a date
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ShiftTemplate {
    #[serde(with = "clock")]
    pub start: Time,
    #[serde(with = "clock")]
    pub end: Time,
    #[serde(default)]
    pub breaks: Vec<ClockInterval>,
}

impl ShiftTemplate {
    pub fn anchor(&self, date: Date) -> WorkTime {
        WorkTime {
            span: ClockInterval(self.start, self.end).on(date),
            breaks: self.breaks.iter().map(|b| b.on(date)).collect(),
        }
    }
}

/// Default hours for each day of the week.  A day without a template is a
/// day off.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WeekdaySchedule {
    // Indexed from Sunday
    days: [Option<ShiftTemplate>; 7],
}

impl WeekdaySchedule {
    pub fn new(days: [Option<ShiftTemplate>; 7]) -> WeekdaySchedule {
        WeekdaySchedule { days }
    }

    /// A schedule without any working days
    pub fn empty() -> WeekdaySchedule {
        WeekdaySchedule::new(std::array::from_fn(|_| None))
    }

    pub fn for_weekday(&self, weekday: Weekday) -> Option<&ShiftTemplate> {
        self.days
            .get(usize::from(weekday.number_days_from_sunday()))
            .and_then(Option::as_ref)
    }

    /// The default work time for `date`, if its weekday is a working day
    pub fn work_time_for(&self, date: Date) -> Option<WorkTime> {
        self.days
            .get(usize::from(weekday_index(date)))
            .and_then(Option::as_ref)
            .map(|shift| shift.anchor(date))
    }
}

impl Default for WeekdaySchedule {
    /// Monday through Friday, 08:00 to 16:30 with a half-hour lunch break
    fn default() -> WeekdaySchedule {
        let shift = ShiftTemplate {
            start: time!(8:00),
            end: time!(16:30),
            breaks: vec![ClockInterval(time!(12:00), time!(12:30))],
        };
        WeekdaySchedule::new([
            None,
            Some(shift.clone()),
            Some(shift.clone()),
            Some(shift.clone()),
            Some(shift.clone()),
            Some(shift),
            None,
        ])
    }
}

/// Edited work times waiting to be written, one pending save per day.
/// Each new edit of a day restarts that day's idle period, so a burst of
/// edits results in a single write of the last value.
#[derive(Clone, Debug)]
pub struct SaveQueue {
    idle: std::time::Duration,
    pending: BTreeMap<Date, Debouncer<WorkTime>>,
}

impl SaveQueue {
    pub fn new(idle: std::time::Duration) -> SaveQueue {
        SaveQueue {
            idle,
            pending: BTreeMap::new(),
        }
    }

    pub fn edit(&mut self, work_time: WorkTime, now: Instant) {
        let idle = self.idle;
        self.pending
            .entry(work_time.date())
            .or_insert_with(|| Debouncer::new(idle))
            .push(work_time, now);
    }

    /// The unsaved value for `date`, if any
    pub fn pending(&self, date: Date) -> Option<&WorkTime> {
        self.pending.get(&date).and_then(Debouncer::last_value)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().filter_map(Debouncer::deadline).min()
    }

    /// Write every value whose idle period has passed.  A value that fails
    /// to save stays queued while the others are still written.  Returns the
    /// number of values written, or the first failure.
    pub fn save_due<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: Instant,
    ) -> Result<usize, StoreError> {
        let due = self
            .pending
            .iter()
            .filter(|(_, d)| d.is_due(now))
            .map(|(&date, _)| date)
            .collect::<Vec<_>>();
        self.write(store, due, now)
    }

    /// Write all pending values regardless of their idle periods
    pub fn save_all<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> Result<usize, StoreError> {
        let all = self.pending.keys().copied().collect::<Vec<_>>();
        self.write(store, all, Instant::now())
    }

    fn write<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        dates: Vec<Date>,
        now: Instant,
    ) -> Result<usize, StoreError> {
        let mut saved = 0;
        let mut first_error = None;
        for date in dates {
            if let Some(mut debouncer) = self.pending.remove(&date) {
                if let Some(work_time) = debouncer.flush() {
                    if let Err(e) = persist(store, &work_time) {
                        tracing::warn!(date = %date_key(date), error = %e, "failed to save work time");
                        debouncer.push(work_time, now);
                        self.pending.insert(date, debouncer);
                        first_error.get_or_insert(e);
                        continue;
                    }
                    tracing::info!(
                        date = %date_key(date),
                        duration = %format_duration(work_time.duration()),
                        "saved work time"
                    );
                    saved += 1;
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(saved),
        }
    }
}
