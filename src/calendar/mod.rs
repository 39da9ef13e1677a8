mod trading_calendar;

pub use trading_calendar::*;
