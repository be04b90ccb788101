use std::{
    collections::{HashSet, VecDeque},
    fmt,
};

use crate::{schedule::PrayerEvent, time::DateKey};

pub const DEFAULT_MARKER_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Event(PrayerEvent),
    KultumMaghrib,
}

/// Records that one notification was delivered for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationMarker {
    pub date_key: DateKey,
    pub kind: MarkerKind,
}

impl NotificationMarker {
    pub fn event(date_key: DateKey, event: PrayerEvent) -> Self {
        Self {
            date_key,
            kind: MarkerKind::Event(event),
        }
    }

    pub fn kultum(date_key: DateKey) -> Self {
        Self {
            date_key,
            kind: MarkerKind::KultumMaghrib,
        }
    }
}

impl fmt::Display for NotificationMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MarkerKind::Event(event) => write!(f, "{}:{}", self.date_key, event),
            MarkerKind::KultumMaghrib => write!(f, "{}:kultum-maghrib", self.date_key),
        }
    }
}

/// Bounded set of delivered markers. Once full, the oldest marker is evicted
/// for every new one.
pub struct MarkerSet {
    capacity: usize,
    order: VecDeque<NotificationMarker>,
    members: HashSet<NotificationMarker>,
}

impl MarkerSet {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    pub fn contains(&self, marker: &NotificationMarker) -> bool {
        self.members.contains(marker)
    }

    /// Returns `false` when the marker was already present.
    pub fn insert(&mut self, marker: NotificationMarker) -> bool {
        if !self.members.insert(marker) {
            return false;
        }

        self.order.push_back(marker);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }

        true
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_CAPACITY)
    }
}
