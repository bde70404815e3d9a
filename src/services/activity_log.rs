//! Peer activity log kept newest first.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use crate::services::ports::LogLine;

/// Lines retained by [`ActivityLog::default`].
pub const DEFAULT_CAPACITY: usize = 20;

/// Bounded list of activity lines. The most recent line is always first;
/// once full, the oldest line is dropped.
#[derive(Debug)]
pub struct ActivityLog {
    lines: Mutex<VecDeque<LogLine>>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityLog {
    /// Log retaining at most `capacity` lines (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Put `line` at the top of the log.
    pub fn prepend(&self, line: LogLine) {
        let mut lines = self.lock();
        lines.push_front(line);
        lines.truncate(self.capacity);
    }

    /// Retained lines, most recent first.
    pub fn lines(&self) -> Vec<LogLine> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogLine>> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(log: &ActivityLog) -> Vec<String> {
        log.lines().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn later_lines_appear_above_earlier_ones() {
        let log = ActivityLog::default();
        log.prepend(LogLine::system("connected"));
        log.prepend(LogLine::player("Ada", "started a new game"));

        assert_eq!(rendered(&log), ["Ada started a new game", "game connected"]);
    }

    #[test]
    fn full_log_drops_the_oldest_line() {
        let log = ActivityLog::with_capacity(2);
        log.prepend(LogLine::player("Ada", "scored 1"));
        log.prepend(LogLine::player("Bob", "scored 2"));
        log.prepend(LogLine::player("Eve", "scored 3"));

        assert_eq!(rendered(&log), ["Eve scored 3", "Bob scored 2"]);
    }

    #[test]
    fn zero_capacity_still_keeps_the_latest_line() {
        let log = ActivityLog::with_capacity(0);
        log.prepend(LogLine::system("connected"));
        log.prepend(LogLine::system("disconnected"));

        assert_eq!(rendered(&log), ["game disconnected"]);
    }
}
