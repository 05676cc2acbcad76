//! A small template language for rendering and reading dates and times.
//!
//! Templates are plain strings in which the two-character codes `Y4`, `Y2`,
//! `M2`, `M1`, `MM`, `D2`, `D1`, `W0`, `W9`, `h2`, `h1`, `m2`, `m1`, `s2`,
//! and `s1` stand for date and time fields; everything else is copied
//! literally.  There is no escape syntax, so literal text that happens to
//! spell one of the codes is substituted as well.
use crate::calendar::{month0, weekday_index, CalendarDay};
use std::fmt;
use thiserror::Error;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Names used when rendering `MM`, `W0`, and `W9`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Locale {
    /// Indexed from Sunday
    pub weekdays_short: [&'static str; 7],
    /// Indexed from Sunday
    pub weekdays_long: [&'static str; 7],
    /// Indexed from January
    pub months: [&'static str; 12],
}

impl Locale {
    pub const GERMAN: Locale = Locale {
        weekdays_short: ["So", "Mo", "Di", "Mi", "Do", "Fr", "Sa"],
        weekdays_long: [
            "Sonntag",
            "Montag",
            "Dienstag",
            "Mittwoch",
            "Donnerstag",
            "Freitag",
            "Samstag",
        ],
        months: [
            "Januar",
            "Februar",
            "März",
            "April",
            "Mai",
            "Juni",
            "Juli",
            "August",
            "September",
            "Oktober",
            "November",
            "Dezember",
        ],
    };
}

impl Default for Locale {
    fn default() -> Locale {
        Locale::GERMAN
    }
}

/// Something with both a calendar day and a clock time.  Plain dates render
/// as midnight.
pub trait ClockTime: CalendarDay {
    fn clock_time(&self) -> Time;
}

impl ClockTime for Date {
    fn clock_time(&self) -> Time {
        Time::MIDNIGHT
    }
}

impl ClockTime for PrimitiveDateTime {
    fn clock_time(&self) -> Time {
        self.time()
    }
}

impl ClockTime for OffsetDateTime {
    fn clock_time(&self) -> Time {
        self.time()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Token {
    Year4,
    Year2,
    Month2,
    Month1,
    MonthName,
    Day2,
    Day1,
    WeekdayShort,
    WeekdayLong,
    Hour2,
    Hour1,
    Minute2,
    Minute1,
    Second2,
    Second1,
}

impl Token {
    fn from_code(code: &str) -> Option<Token> {
        match code {
            "Y4" => Some(Token::Year4),
            "Y2" => Some(Token::Year2),
            "M2" => Some(Token::Month2),
            "M1" => Some(Token::Month1),
            "MM" => Some(Token::MonthName),
            "D2" => Some(Token::Day2),
            "D1" => Some(Token::Day1),
            "W0" => Some(Token::WeekdayShort),
            "W9" => Some(Token::WeekdayLong),
            "h2" => Some(Token::Hour2),
            "h1" => Some(Token::Hour1),
            "m2" => Some(Token::Minute2),
            "m1" => Some(Token::Minute1),
            "s2" => Some(Token::Second2),
            "s1" => Some(Token::Second1),
            _ => None,
        }
    }

    fn code(self) -> &'static str {
        match self {
            Token::Year4 => "Y4",
            Token::Year2 => "Y2",
            Token::Month2 => "M2",
            Token::Month1 => "M1",
            Token::MonthName => "MM",
            Token::Day2 => "D2",
            Token::Day1 => "D1",
            Token::WeekdayShort => "W0",
            Token::WeekdayLong => "W9",
            Token::Hour2 => "h2",
            Token::Hour1 => "h1",
            Token::Minute2 => "m2",
            Token::Minute1 => "m1",
            Token::Second2 => "s2",
            Token::Second1 => "s1",
        }
    }

    /// The fewest digits this code renders as, or `None` for name codes
    fn min_digits(self) -> Option<usize> {
        match self {
            Token::Year4 => Some(4),
            Token::Year2
            | Token::Month2
            | Token::Day2
            | Token::Hour2
            | Token::Minute2
            | Token::Second2 => Some(2),
            Token::Month1 | Token::Day1 | Token::Hour1 | Token::Minute1 | Token::Second1 => Some(1),
            Token::MonthName | Token::WeekdayShort | Token::WeekdayLong => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// A template split into literal text and field codes.  Code positions are
/// fixed when the template is built, so a field's rendering is never
/// re-scanned for codes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn new(template: &str) -> Template {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        while let Some(ch) = rest.chars().next() {
            if let Some(token) = rest.get(..2).and_then(Token::from_code) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Token(token));
                rest = &rest[2..];
            } else {
                literal.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Template { segments }
    }
}

impl From<&str> for Template {
    fn from(template: &str) -> Template {
        Template::new(template)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => write!(f, "{s}")?,
                Segment::Token(t) => write!(f, "{}", t.code())?,
            }
        }
        Ok(())
    }
}

/// Left-pad the decimal representation of `number` to `width` characters
/// with zeros or, if `zero_fill` is false, spaces.  Numbers wider than
/// `width` are returned whole, and a width of zero means no padding.
pub fn pad_number(number: u64, width: usize, zero_fill: bool) -> String {
    if zero_fill {
        format!("{number:0>width$}")
    } else {
        format!("{number:>width$}")
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Formatter {
    locale: Locale,
}

impl Formatter {
    pub fn new(locale: Locale) -> Formatter {
        Formatter { locale }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn format<T: ClockTime + ?Sized>(&self, value: &T, template: &Template) -> String {
        let date = value.calendar_date();
        let time = value.clock_time();
        let mut s = String::new();
        for seg in &template.segments {
            match *seg {
                Segment::Literal(ref lit) => s.push_str(lit),
                Segment::Token(token) => s.push_str(&self.render(token, date, time)),
            }
        }
        s
    }

    fn render(&self, token: Token, date: Date, time: Time) -> String {
        match token {
            Token::Year4 => {
                let digits = pad_number(u64::from(date.year().unsigned_abs()), 4, true);
                if date.year() < 0 {
                    format!("-{digits}")
                } else {
                    digits
                }
            }
            Token::Year2 => pad_number(u64::from(date.year().rem_euclid(100).unsigned_abs()), 2, true),
            Token::Month2 => pad_number(u64::from(u8::from(date.month())), 2, true),
            Token::Month1 => u8::from(date.month()).to_string(),
            Token::MonthName => self.locale.months[usize::from(month0(date))].to_owned(),
            Token::Day2 => pad_number(u64::from(date.day()), 2, true),
            Token::Day1 => date.day().to_string(),
            Token::WeekdayShort => {
                self.locale.weekdays_short[usize::from(weekday_index(date))].to_owned()
            }
            Token::WeekdayLong => {
                self.locale.weekdays_long[usize::from(weekday_index(date))].to_owned()
            }
            Token::Hour2 => pad_number(u64::from(time.hour()), 2, true),
            Token::Hour1 => time.hour().to_string(),
            Token::Minute2 => pad_number(u64::from(time.minute()), 2, true),
            Token::Minute1 => time.minute().to_string(),
            Token::Second2 => pad_number(u64::from(time.second()), 2, true),
            Token::Second1 => time.second().to_string(),
        }
    }

    /// Read the fields of `template` back out of `text`.
    ///
    /// Template and text are walked side by side: literal text skips the
    /// same number of characters in `text`, padded codes read exactly their
    /// width, unpadded codes read one or two digits, and name codes read a
    /// name from the locale.  An unpadded code directly followed by other
    /// numeric codes leaves them the digits they need.  When a field appears more than once, the
    /// unpadded code wins over the padded one (`Y2` over `Y4`; `M1`, then
    /// `MM`, then `M2`).  Fields absent from the template are 0, and fields
    /// whose text is missing or not a number are left as `None`.
    pub fn parse(&self, text: &str, template: &Template) -> DateFields {
        let mut captures = Vec::with_capacity(template.segments.len());
        let mut rest = text;
        for (i, seg) in template.segments.iter().enumerate() {
            match *seg {
                Segment::Literal(ref lit) => rest = skip_chars(rest, lit.chars().count()),
                Segment::Token(token) => {
                    let reserve = template.segments[i + 1..]
                        .iter()
                        .map_while(|seg| match *seg {
                            Segment::Token(t) => t.min_digits(),
                            Segment::Literal(_) => None,
                        })
                        .sum();
                    let (value, tail) = self.capture(token, rest, reserve);
                    captures.push((token, value));
                    rest = tail;
                }
            }
        }
        let pick = |order: &[Token]| -> Option<i32> {
            order
                .iter()
                .find_map(|&t| captures.iter().find(|&&(tok, _)| tok == t))
                .map_or(Some(0), |&(_, value)| value)
        };
        DateFields {
            year: pick(&[Token::Year2, Token::Year4]),
            month0: pick(&[Token::Month1, Token::MonthName, Token::Month2]),
            day: pick(&[Token::Day1, Token::Day2]),
            hour: pick(&[Token::Hour1, Token::Hour2]),
            minute: pick(&[Token::Minute1, Token::Minute2]),
            second: pick(&[Token::Second1, Token::Second2]),
        }
    }

    // Returns the field value (already adjusted to the field's convention,
    // e.g. zero-based months) and the remaining text.  `reserve` digits are
    // owed to the numeric codes that follow without a separator.
    fn capture<'t>(&self, token: Token, text: &'t str, reserve: usize) -> (Option<i32>, &'t str) {
        match token {
            Token::Year4 => fixed_digits(text, 4),
            Token::Year2 => {
                let (value, rest) = fixed_digits(text, 2);
                (value.map(|yy| 2000 + yy), rest)
            }
            Token::Month2 => {
                let (value, rest) = fixed_digits(text, 2);
                (value.map(|m| m - 1), rest)
            }
            Token::Month1 => {
                let (value, rest) = loose_digits(text, reserve);
                (value.map(|m| m - 1), rest)
            }
            Token::MonthName => name_index(text, &self.locale.months),
            Token::WeekdayShort => name_index(text, &self.locale.weekdays_short),
            Token::WeekdayLong => name_index(text, &self.locale.weekdays_long),
            Token::Day2 | Token::Hour2 | Token::Minute2 | Token::Second2 => fixed_digits(text, 2),
            Token::Day1 | Token::Hour1 | Token::Minute1 | Token::Second1 => {
                loose_digits(text, reserve)
            }
        }
    }
}

fn skip_chars(text: &str, n: usize) -> &str {
    text.char_indices().nth(n).map_or("", |(i, _)| &text[i..])
}

fn fixed_digits(text: &str, width: usize) -> (Option<i32>, &str) {
    let field = text.get(..width).unwrap_or(text);
    let value = if field.len() == width && field.bytes().all(|b| b.is_ascii_digit()) {
        field.parse::<i32>().ok()
    } else {
        None
    };
    (value, skip_chars(text, width))
}

fn loose_digits(text: &str, reserve: usize) -> (Option<i32>, &str) {
    let available = text.bytes().take_while(u8::is_ascii_digit).count();
    let len = available.saturating_sub(reserve).clamp(1, 2).min(available);
    if len == 0 {
        (None, text)
    } else {
        (text[..len].parse::<i32>().ok(), &text[len..])
    }
}

fn name_index<'t>(text: &'t str, names: &[&str]) -> (Option<i32>, &'t str) {
    names
        .iter()
        .enumerate()
        .filter(|&(_, name)| text.starts_with(name))
        .max_by_key(|&(_, name)| name.len())
        .and_then(|(i, name)| Some((i32::try_from(i).ok()?, &text[name.len()..])))
        .map_or((None, text), |(i, rest)| (Some(i), rest))
}

/// Render `value` with `template` in the default locale
pub fn format<T: ClockTime + ?Sized>(value: &T, template: &str) -> String {
    Formatter::default().format(value, &Template::new(template))
}

/// Read `text` with `template` in the default locale
pub fn parse(text: &str, template: &str) -> DateFields {
    Formatter::default().parse(text, &Template::new(template))
}

/// Raw fields read by [`Formatter::parse`].  `None` marks a field whose
/// text could not be read.  Nothing is validated until one of the `to_*`
/// methods is called.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DateFields {
    pub year: Option<i32>,
    /// Zero-based, 0 = January
    pub month0: Option<i32>,
    pub day: Option<i32>,
    pub hour: Option<i32>,
    pub minute: Option<i32>,
    pub second: Option<i32>,
}

impl DateFields {
    pub fn to_date(&self) -> Result<Date, FieldsError> {
        let year = require(Field::Year, self.year)?;
        if !(-9999..=9999).contains(&year) {
            return Err(FieldsError::OutOfRange {
                field: Field::Year,
                value: year,
            });
        }
        let month1 = require(Field::Month, self.month0)?.saturating_add(1);
        let month = u8::try_from(month1)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .ok_or(FieldsError::OutOfRange {
                field: Field::Month,
                value: month1,
            })?;
        let day = require(Field::Day, self.day)?;
        u8::try_from(day)
            .ok()
            .and_then(|d| Date::from_calendar_date(year, month, d).ok())
            .ok_or(FieldsError::OutOfRange {
                field: Field::Day,
                value: day,
            })
    }

    pub fn to_time(&self) -> Result<Time, FieldsError> {
        let hour = bounded(Field::Hour, self.hour, 23)?;
        let minute = bounded(Field::Minute, self.minute, 59)?;
        let second = bounded(Field::Second, self.second, 59)?;
        Time::from_hms(hour, minute, second).map_err(|_| FieldsError::OutOfRange {
            field: Field::Hour,
            value: i32::from(hour),
        })
    }

    pub fn to_datetime(&self) -> Result<PrimitiveDateTime, FieldsError> {
        Ok(PrimitiveDateTime::new(self.to_date()?, self.to_time()?))
    }
}

fn require(field: Field, value: Option<i32>) -> Result<i32, FieldsError> {
    value.ok_or(FieldsError::Unreadable(field))
}

fn bounded(field: Field, value: Option<i32>, max: u8) -> Result<u8, FieldsError> {
    let value = require(field, value)?;
    u8::try_from(value)
        .ok()
        .filter(|&v| v <= max)
        .ok_or(FieldsError::OutOfRange { field, value })
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Year => "year",
            Field::Month => "month",
            Field::Day => "day",
            Field::Hour => "hour",
            Field::Minute => "minute",
            Field::Second => "second",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum FieldsError {
    #[error("could not read {0}")]
    Unreadable(Field),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: Field, value: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn test_pad_number() {
        assert_eq!(pad_number(7, 2, true), "07");
        assert_eq!(pad_number(7, 3, false), "  7");
        assert_eq!(pad_number(0, 2, true), "00");
        assert_eq!(pad_number(2024, 2, true), "2024");
        assert_eq!(pad_number(42, 0, true), "42");
    }

    #[test]
    fn test_format_row_label() {
        // 2024-01-08 is a Monday
        assert_eq!(format(&date!(2024 - 01 - 08), "W0. Y4-M2-D2"), "Mo. 2024-01-08");
        assert_eq!(
            format(&date!(2024 - 03 - 05), "W9, D1. MM Y4"),
            "Dienstag, 5. März 2024"
        );
    }

    #[test]
    fn test_format_time_tokens() {
        let dt = datetime!(2024-06-09 7:05:03);
        assert_eq!(format(&dt, "h2:m2:s2"), "07:05:03");
        assert_eq!(format(&dt, "h1:m1:s1"), "7:5:3");
        assert_eq!(format(&date!(2024 - 06 - 09), "h2:m2"), "00:00");
    }

    #[test]
    fn test_format_short_year() {
        assert_eq!(format(&date!(2009 - 11 - 30), "D2.M2.Y2"), "30.11.09");
        let early = Date::from_calendar_date(999, Month::January, 1).unwrap();
        assert_eq!(format(&early, "Y4"), "0999");
    }

    #[test]
    fn test_format_passes_other_text_through() {
        assert_eq!(format(&date!(2024 - 01 - 08), "Datum: Y4 (KW?)"), "Datum: 2024 (KW?)");
        assert_eq!(format(&date!(2024 - 01 - 08), "Y3 M3 D0"), "Y3 M3 D0");
    }

    #[test]
    fn test_expansion_is_not_rescanned() {
        assert_eq!(format(&datetime!(2024-03-05 9:00), "MMh2"), "März09");
        assert_eq!(format(&date!(2024 - 05 - 01), "MM M1"), "Mai 5");
    }

    #[test]
    fn test_template_display_round_trips() {
        let t = Template::new("W0. Y4-M2-D2 [h2:m2]");
        assert_eq!(t.to_string(), "W0. Y4-M2-D2 [h2:m2]");
    }

    #[test]
    fn test_parse_date() {
        let fields = parse("2024-03-31", "Y4-M2-D2");
        assert_eq!(fields.year, Some(2024));
        assert_eq!(fields.month0, Some(2));
        assert_eq!(fields.day, Some(31));
        assert_eq!(fields.hour, Some(0));
        assert_eq!(fields.to_date(), Ok(date!(2024 - 03 - 31)));
    }

    #[test]
    fn test_parse_unpadded_and_names() {
        let fields = parse("Sonntag, 8. Dezember 2024", "W9, D1. MM Y4");
        assert_eq!(fields.to_date(), Ok(date!(2024 - 12 - 08)));
        let fields = parse("5.3.2024", "D1.M1.Y4");
        assert_eq!(fields.to_date(), Ok(date!(2024 - 03 - 05)));
    }

    #[test]
    fn test_parse_time() {
        let fields = parse("16:30", "h2:m2");
        assert_eq!(fields.to_time(), Ok(time!(16:30)));
        assert_eq!(fields.year, Some(0));
    }

    #[test]
    fn test_parse_prefers_unpadded_year() {
        let fields = parse("24 1999", "Y2 Y4");
        assert_eq!(fields.year, Some(2024));
    }

    #[test]
    fn test_parse_short_text() {
        let fields = parse("2024-0", "Y4-M2-D2");
        assert_eq!(fields.year, Some(2024));
        assert_eq!(fields.month0, None);
        assert_eq!(fields.day, None);
        assert_eq!(fields.to_date(), Err(FieldsError::Unreadable(Field::Month)));
    }

    #[test]
    fn test_parse_garbage() {
        let fields = parse("ab:cd", "h2:m2");
        assert_eq!(fields.hour, None);
        assert_eq!(fields.minute, None);
        assert_eq!(fields.to_time(), Err(FieldsError::Unreadable(Field::Hour)));
    }

    #[test]
    fn test_invalid_dates_are_reported() {
        let fields = parse("2023-02-29", "Y4-M2-D2");
        assert_eq!(
            fields.to_date(),
            Err(FieldsError::OutOfRange {
                field: Field::Day,
                value: 29
            })
        );
        let fields = parse("2023-13-01", "Y4-M2-D2");
        assert_eq!(
            fields.to_date(),
            Err(FieldsError::OutOfRange {
                field: Field::Month,
                value: 13
            })
        );
        // Day defaults to 0 when absent from the template
        assert_eq!(
            parse("2023-05", "Y4-M2").to_date(),
            Err(FieldsError::OutOfRange {
                field: Field::Day,
                value: 0
            })
        );
        assert_eq!(
            parse("24:00", "h2:m2").to_time(),
            Err(FieldsError::OutOfRange {
                field: Field::Hour,
                value: 24
            })
        );
    }

    fn any_datetime() -> impl Strategy<Value = PrimitiveDateTime> {
        (
            Date::from_calendar_date(0, Month::January, 1)
                .unwrap()
                .to_julian_day()
                ..=Date::from_calendar_date(9999, Month::December, 31)
                    .unwrap()
                    .to_julian_day(),
            0u8..24,
            0u8..60,
            0u8..60,
        )
            .prop_map(|(jd, h, m, s)| {
                PrimitiveDateTime::new(
                    Date::from_julian_day(jd).unwrap(),
                    Time::from_hms(h, m, s).unwrap(),
                )
            })
    }

    #[test]
    fn test_parse_unpadded_before_digits() {
        let dt = datetime!(2024-03-05 7:05);
        let text = format(&dt, "h1m2");
        assert_eq!(text, "705");
        assert_eq!(parse(&text, "h1m2").to_time(), Ok(time!(7:05)));
        assert_eq!(parse("1205", "h1m2").to_time(), Ok(time!(12:05)));

        let text = format(&dt, "D1M2Y4");
        assert_eq!(text, "5032024");
        assert_eq!(parse(&text, "D1M2Y4").to_date(), Ok(date!(2024 - 03 - 05)));
        assert_eq!(parse("15032024", "D1M2Y4").to_date(), Ok(date!(2024 - 03 - 15)));
    }

    proptest! {
        #[test]
        fn padded_templates_round_trip(dt in any_datetime()) {
            let t = "Y4-M2-D2 h2:m2:s2";
            prop_assert_eq!(parse(&format(&dt, t), t).to_datetime(), Ok(dt));
        }

        #[test]
        fn named_templates_round_trip(dt in any_datetime()) {
            let t = "W9, D1. MM Y4";
            prop_assert_eq!(parse(&format(&dt, t), t).to_date(), Ok(dt.date()));
        }

        #[test]
        fn unpadded_templates_round_trip(dt in any_datetime()) {
            let t = "D1.M1.Y4 h1:m1";
            let fields = parse(&format(&dt, t), t);
            prop_assert_eq!(fields.to_date(), Ok(dt.date()));
            prop_assert_eq!(fields.hour, Some(i32::from(dt.hour())));
            prop_assert_eq!(fields.minute, Some(i32::from(dt.minute())));
        }

        #[test]
        fn unpadded_codes_before_digits_round_trip(dt in any_datetime()) {
            let t = "D1M2Y4 h1m2s2";
            prop_assert_eq!(parse(&format(&dt, t), t).to_datetime(), Ok(dt));
        }
    }
}
