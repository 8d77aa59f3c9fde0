use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a toast stays on screen
pub const TOAST_TTL: Duration = Duration::from_secs(5);
const MAX_VISIBLE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Primary,
    Danger,
    Secondary,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub created: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    queue: VecDeque<Toast>,
}

impl Toasts {
    pub fn push(&mut self, title: impl Into<String>, message: impl Into<String>, kind: ToastKind) {
        self.push_at(title, message, kind, Instant::now());
    }

    pub fn push_at(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: ToastKind,
        now: Instant,
    ) {
        self.queue.push_back(Toast {
            title: title.into(),
            message: message.into(),
            kind,
            created: now,
        });
        while self.queue.len() > MAX_VISIBLE {
            self.queue.pop_front();
        }
    }

    /// Drop toasts older than the TTL
    pub fn prune(&mut self, now: Instant) {
        self.queue
            .retain(|t| now.saturating_duration_since(t.created) < TOAST_TTL);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_drops_expired() {
        let start = Instant::now();
        let mut toasts = Toasts::default();
        toasts.push_at("Data Updated", "ok", ToastKind::Success, start);
        toasts.push_at("Mission Completed!", "ok", ToastKind::Success, start + Duration::from_secs(3));
        toasts.prune(start + Duration::from_secs(6));
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.iter().next().map(|t| t.title.as_str()), Some("Mission Completed!"));
        toasts.prune(start + Duration::from_secs(9));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_keeps_newest_when_full() {
        let mut toasts = Toasts::default();
        for n in 0..6 {
            toasts.push(format!("t{n}"), "", ToastKind::Info);
        }
        assert_eq!(toasts.len(), MAX_VISIBLE);
        assert_eq!(toasts.iter().next().map(|t| t.title.as_str()), Some("t2"));
    }
}
