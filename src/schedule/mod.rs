mod model;
mod service;

pub use model::{DailyEntry, Location, MonthlySchedule, PrayerEvent, PrayerTimes, Schedule};
pub use service::{ScheduleError, ScheduleService};
