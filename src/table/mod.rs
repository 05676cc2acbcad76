mod row;
mod widget;
mod window;
pub(crate) use self::row::RowFormat;
pub(crate) use self::widget::Timesheet;
pub(crate) use self::window::DayWindow;
