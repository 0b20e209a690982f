//! Deadline queue for the event loop.

use std::time::Instant;

use super::requests::RequestId;
use crate::ui::NotificationId;

/// What happens when a deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Debounced redraw after entering the analytics panel.
    RefreshAnalytics,
    DismissNotification(NotificationId),
    /// Safety timeout: give up on a request that never settled.
    LoadingTimeout(RequestId),
}

/// Small unordered set of pending deadlines. The number of live timers is
/// bounded by in-flight requests plus visible notifications.
#[derive(Debug, Default)]
pub struct Timers {
    pending: Vec<(Instant, TimerKind)>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: Instant, kind: TimerKind) {
        self.pending.push((at, kind));
    }

    /// Schedule `kind`, dropping any earlier instance of it (debounce).
    pub fn reschedule(&mut self, at: Instant, kind: TimerKind) {
        self.cancel(kind);
        self.schedule(at, kind);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.pending.retain(|(_, k)| *k != kind);
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|(_, k)| *k == kind)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(at, _)| *at).min()
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due: Vec<(Instant, TimerKind)> = Vec::new();
        self.pending.retain(|&(at, kind)| {
            if at <= now {
                due.push((at, kind));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, kind)| kind).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn take_due_returns_expired_in_deadline_order() {
        let base = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(base + Duration::from_millis(30), TimerKind::DismissNotification(2));
        timers.schedule(base + Duration::from_millis(10), TimerKind::DismissNotification(1));
        timers.schedule(base + Duration::from_secs(60), TimerKind::LoadingTimeout(9));

        let due = timers.take_due(base + Duration::from_millis(50));
        assert_eq!(
            due,
            vec![
                TimerKind::DismissNotification(1),
                TimerKind::DismissNotification(2)
            ]
        );
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(base + Duration::from_secs(60)));
    }

    #[test]
    fn reschedule_replaces_pending_instance() {
        let base = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(base, TimerKind::RefreshAnalytics);
        timers.reschedule(base + Duration::from_millis(100), TimerKind::RefreshAnalytics);

        assert_eq!(timers.len(), 1);
        assert!(timers.take_due(base).is_empty());
        assert_eq!(
            timers.take_due(base + Duration::from_millis(100)),
            vec![TimerKind::RefreshAnalytics]
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn cancel_removes_only_matching_kind() {
        let base = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(base, TimerKind::LoadingTimeout(1));
        timers.schedule(base, TimerKind::LoadingTimeout(2));
        timers.cancel(TimerKind::LoadingTimeout(1));

        assert!(!timers.is_scheduled(TimerKind::LoadingTimeout(1)));
        assert!(timers.is_scheduled(TimerKind::LoadingTimeout(2)));
    }
}
