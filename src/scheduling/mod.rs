mod job;
mod marker;
mod presence;
mod reminder;
mod resolver;
pub mod window;

pub use job::{PeriodicJob, spawn_periodic};
pub use marker::{DEFAULT_MARKER_CAPACITY, MarkerKind, MarkerSet, NotificationMarker};
pub use presence::{PresenceUpdater, WARM_LINES, select_presence};
pub use reminder::{ReminderDispatcher, ReminderSettings};
pub use resolver::{EventResolver, ResolvedEvent};
