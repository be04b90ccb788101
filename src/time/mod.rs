//! Civil time handling: calendar date keys and conversion between local
//! wall-clock times and absolute instants.

mod civil;
mod countdown;
mod date_key;

pub use civil::{civil_to_instant, instant_to_date_key, local_to_instant, parse_time_of_day};
pub use countdown::{format_countdown, ramadan_day};
pub use date_key::{DateKey, InvalidDateKey, days_between};
