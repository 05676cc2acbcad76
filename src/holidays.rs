use crate::calendar::{add_days, easter_date, is_same_day};
use crate::timefmt::iso_date;
use crate::worktime::WeekdaySchedule;
use serde::Deserialize;
use time::{Date, Month, Weekday};

/// When a holiday falls in a given year
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Observance {
    /// The same month and day every year
    Fixed { month: Month, day: u8 },
    /// A fixed number of days after (or before) Easter Sunday
    Easter { offset_days: i64 },
}

impl Observance {
    pub fn occurs_on(&self, date: Date) -> bool {
        match *self {
            Observance::Fixed { month, day } => date.month() == month && date.day() == day,
            Observance::Easter { offset_days } => easter_date(date.year())
                .and_then(|easter| add_days(easter, offset_days))
                .is_ok_and(|d| is_same_day(&d, &date)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HolidayRule {
    pub name: String,
    pub observance: Observance,
}

impl HolidayRule {
    pub fn fixed(name: &str, month: Month, day: u8) -> HolidayRule {
        HolidayRule {
            name: name.to_owned(),
            observance: Observance::Fixed { month, day },
        }
    }

    pub fn easter(name: &str, offset_days: i64) -> HolidayRule {
        HolidayRule {
            name: name.to_owned(),
            observance: Observance::Easter { offset_days },
        }
    }
}

/// An ordered list of holiday rules.  When several rules match the same
/// date, their names are reported in table order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HolidayTable {
    rules: Vec<HolidayRule>,
}

impl HolidayTable {
    pub fn new(rules: Vec<HolidayRule>) -> HolidayTable {
        HolidayTable { rules }
    }

    /// Public holidays of Austria
    pub fn austria() -> HolidayTable {
        use Month::*;
        HolidayTable::new(vec![
            HolidayRule::fixed("Neujahr", January, 1),
            HolidayRule::fixed("Heilige Drei Könige", January, 6),
            HolidayRule::easter("Ostersonntag", 0),
            HolidayRule::easter("Ostermontag", 1),
            HolidayRule::fixed("Staatsfeiertag", May, 1),
            HolidayRule::easter("Christi Himmelfahrt", 39),
            HolidayRule::easter("Pfingstsonntag", 49),
            HolidayRule::easter("Pfingstmontag", 50),
            HolidayRule::easter("Fronleichnam", 60),
            HolidayRule::fixed("Mariä Himmelfahrt", August, 15),
            HolidayRule::fixed("Nationalfeiertag", October, 26),
            HolidayRule::fixed("Allerheiligen", November, 1),
            HolidayRule::fixed("Mariä Empfängnis", December, 8),
            HolidayRule::fixed("Heiliger Abend", December, 24),
            HolidayRule::fixed("Christtag", December, 25),
            HolidayRule::fixed("Stefanitag", December, 26),
            HolidayRule::fixed("Silvester", December, 31),
        ])
    }

    pub fn rules(&self) -> &[HolidayRule] {
        &self.rules
    }

    pub fn holidays_on(&self, date: Date) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.observance.occurs_on(date))
            .map(|rule| rule.name.as_str())
            .collect()
    }
}

impl Default for HolidayTable {
    fn default() -> HolidayTable {
        HolidayTable::austria()
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Birthday {
    pub name: String,
    #[serde(rename = "date", with = "iso_date")]
    pub date_of_birth: Date,
}

impl Birthday {
    pub fn new(name: &str, date_of_birth: Date) -> Birthday {
        Birthday {
            name: name.to_owned(),
            date_of_birth,
        }
    }

    /// The age turned on `date`, if `date` is this person's birthday
    pub fn age_on(&self, date: Date) -> Option<i32> {
        let born = self.date_of_birth;
        (born.month() == date.month() && born.day() == date.day() && date.year() >= born.year())
            .then_some(date.year() - born.year())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BirthdayOccurrence<'a> {
    pub name: &'a str,
    pub age: i32,
}

pub fn birthdays_on(date: Date, birthdays: &[Birthday]) -> Vec<BirthdayOccurrence<'_>> {
    birthdays
        .iter()
        .filter_map(|b| {
            b.age_on(date).map(|age| BirthdayOccurrence {
                name: &b.name,
                age,
            })
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DayKind {
    pub is_workday: bool,
    pub is_weekend: bool,
}

/// A day is a workday if the schedule has hours for its weekday and no
/// holiday falls on it.  Being a weekend depends only on the weekday.
pub fn classify_day(date: Date, schedule: &WeekdaySchedule, holiday_names: &[&str]) -> DayKind {
    let weekday = date.weekday();
    DayKind {
        is_workday: schedule.for_weekday(weekday).is_some() && holiday_names.is_empty(),
        is_weekend: matches!(weekday, Weekday::Saturday | Weekday::Sunday),
    }
}

/// Everything the timesheet shows about a day apart from its hours
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DayInfo<'a> {
    pub date: Date,
    pub holidays: Vec<&'a str>,
    pub birthdays: Vec<BirthdayOccurrence<'a>>,
    pub kind: DayKind,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Classifier {
    holidays: HolidayTable,
    birthdays: Vec<Birthday>,
    schedule: WeekdaySchedule,
}

impl Classifier {
    pub fn new(
        holidays: HolidayTable,
        birthdays: Vec<Birthday>,
        schedule: WeekdaySchedule,
    ) -> Classifier {
        Classifier {
            holidays,
            birthdays,
            schedule,
        }
    }

    pub fn schedule(&self) -> &WeekdaySchedule {
        &self.schedule
    }

    pub fn day_info(&self, date: Date) -> DayInfo<'_> {
        let holidays = self.holidays.holidays_on(date);
        let kind = classify_day(date, &self.schedule, &holidays);
        DayInfo {
            date,
            holidays,
            birthdays: birthdays_on(date, &self.birthdays),
            kind,
        }
    }
}
