use std::collections::VecDeque;

use chrono::{DateTime, Local};

/// Maximum number of entries kept in the feed
pub const FEED_CAPACITY: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    Fire,
    Resource,
    Risk,
    Weather,
    Info,
}

impl ActivityKind {
    /// Single-glyph icon shown in front of the entry
    pub fn icon(self) -> &'static str {
        match self {
            ActivityKind::Fire => "🔥",
            ActivityKind::Resource => "👥",
            ActivityKind::Risk => "⚠",
            ActivityKind::Weather => "☁",
            ActivityKind::Info => "ℹ",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Activity {
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Local>,
}

impl Activity {
    pub fn new(kind: ActivityKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            timestamp: Local::now(),
        }
    }
}

/// Most-recent-first list of notifications, bounded to `FEED_CAPACITY`
#[derive(Clone, Debug, Default)]
pub struct ActivityFeed {
    entries: VecDeque<Activity>,
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry, evicting the oldest past capacity
    pub fn push(&mut self, activity: Activity) {
        self.entries.push_front(activity);
        while self.entries.len() > FEED_CAPACITY {
            self.entries.pop_back();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&Activity> {
        self.entries.front()
    }

    /// Newest entry of the given kind
    pub fn newest_of(&self, kind: ActivityKind) -> Option<&Activity> {
        self.entries.iter().find(|a| a.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> Activity {
        Activity::new(ActivityKind::Info, format!("entry {n}"), "")
    }

    #[test]
    fn test_sixth_entry_evicts_first() {
        let mut feed = ActivityFeed::new();
        for n in 1..=6 {
            feed.push(entry(n));
        }
        assert_eq!(feed.len(), FEED_CAPACITY);
        let titles: Vec<&str> = feed.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["entry 6", "entry 5", "entry 4", "entry 3", "entry 2"]);
    }

    #[test]
    fn test_newest_first() {
        let mut feed = ActivityFeed::new();
        assert!(feed.newest().is_none());
        feed.push(Activity::new(ActivityKind::Fire, "New Fire Detected", "ridge"));
        feed.push(entry(2));
        assert_eq!(feed.newest().map(|a| a.title.as_str()), Some("entry 2"));
        assert_eq!(
            feed.newest_of(ActivityKind::Fire).map(|a| a.description.as_str()),
            Some("ridge")
        );
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut feed = ActivityFeed::new();
        for n in 0..50 {
            feed.push(entry(n));
            assert!(feed.len() <= FEED_CAPACITY);
        }
    }
}
