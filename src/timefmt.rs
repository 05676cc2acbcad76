// Serde representations of dates and times in config and store files

#[allow(unused_imports, reason = "used inside the modules generated by format_description!")]
use time::{Date, PrimitiveDateTime, Time};

time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");

time::serde::format_description!(pub(crate) clock, Time, "[hour]:[minute]");

time::serde::format_description!(
    pub(crate) iso_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]:[second]"
);
