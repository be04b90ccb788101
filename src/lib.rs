pub mod appsettings;
pub mod clock;
pub mod commands;
pub mod console;
pub mod delivery;
pub mod provider;
pub mod schedule;
pub mod scheduling;
pub mod time;

#[cfg(test)]
mod test_utils;
