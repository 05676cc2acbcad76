use time::Date;
use zeitblatt::format::{Formatter, Template};
use zeitblatt::holidays::{DayInfo, DayKind};
use zeitblatt::worktime::{format_duration, WorkTime};

/// Everything shown on one line of the timesheet, already rendered to text
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct DayRow {
    pub(crate) date: Date,
    pub(crate) label: String,
    pub(crate) hours: Option<Hours>,
    pub(crate) notes: String,
    pub(crate) kind: DayKind,
    pub(crate) is_holiday: bool,
    pub(crate) unsaved: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Hours {
    pub(crate) start: String,
    pub(crate) end: String,
    pub(crate) breaks: String,
    pub(crate) duration: String,
    pub(crate) negative: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct RowFormat {
    formatter: Formatter,
    label: Template,
    clock: Template,
}

impl RowFormat {
    pub(crate) fn new(formatter: Formatter) -> RowFormat {
        RowFormat {
            formatter,
            label: Template::new("W0. Y4-M2-D2"),
            clock: Template::new("h2:m2"),
        }
    }

    pub(crate) fn row(
        &self,
        info: &DayInfo<'_>,
        work_time: Option<&WorkTime>,
        unsaved: bool,
    ) -> DayRow {
        let mut notes = info
            .holidays
            .iter()
            .map(|&name| name.to_owned())
            .collect::<Vec<_>>();
        notes.extend(
            info.birthdays
                .iter()
                .map(|b| format!("{} ({})", b.name, b.age)),
        );
        DayRow {
            date: info.date,
            label: self.formatter.format(&info.date, &self.label),
            hours: work_time.map(|wt| self.hours(wt)),
            notes: notes.join(", "),
            kind: info.kind,
            is_holiday: !info.holidays.is_empty(),
            unsaved,
        }
    }

    fn hours(&self, work_time: &WorkTime) -> Hours {
        let breaks = work_time
            .breaks()
            .iter()
            .map(|b| {
                format!(
                    "{}-{}",
                    self.formatter.format(&b.start(), &self.clock),
                    self.formatter.format(&b.end(), &self.clock)
                )
            })
            .collect::<Vec<_>>();
        let duration = work_time.duration();
        Hours {
            start: self.formatter.format(&work_time.start(), &self.clock),
            end: self.formatter.format(&work_time.end(), &self.clock),
            breaks: breaks.join(" "),
            duration: format_duration(duration),
            negative: duration.is_negative(),
        }
    }
}
