//! Date, holiday, and work-time engine behind the `zeitblatt` timesheet.
//!
//! The [`calendar`] module does date arithmetic and computes Easter,
//! [`format`] renders and reads dates through small text templates,
//! [`holidays`] decides which days are holidays, birthdays, workdays, and
//! weekends, and [`worktime`] models the hours logged for a day along with
//! their persistence in a [`store`].
pub mod calendar;
pub mod config;
pub mod debounce;
pub mod format;
pub mod holidays;
pub mod store;
mod timefmt;
pub mod worktime;
