//! In-process stand-in for the browser history stack.

use std::sync::Mutex;

use nav_core::HistorySink;
use shared::location::Location;

struct Entries {
    stack: Vec<Location>,
    cursor: usize,
}

pub struct ShellHistory {
    entries: Mutex<Entries>,
}

impl ShellHistory {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: Mutex::new(Entries {
                stack: vec![initial],
                cursor: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Moves the cursor back one entry. Returns whether it moved; the
    /// caller is responsible for firing the external-change notification.
    pub fn back(&self) -> bool {
        let mut entries = self.lock();
        if entries.cursor == 0 {
            return false;
        }
        entries.cursor -= 1;
        true
    }

    pub fn forward(&self) -> bool {
        let mut entries = self.lock();
        if entries.cursor + 1 >= entries.stack.len() {
            return false;
        }
        entries.cursor += 1;
        true
    }

    /// Number of entries on the stack, cursor position ignored.
    pub fn entry_count(&self) -> usize {
        self.lock().stack.len()
    }
}

impl HistorySink for ShellHistory {
    fn current_location(&self) -> Location {
        let entries = self.lock();
        entries.stack[entries.cursor].clone()
    }

    fn push(&self, location: &Location) {
        let mut entries = self.lock();
        let cursor = entries.cursor;
        entries.stack.truncate(cursor + 1);
        entries.stack.push(location.clone());
        entries.cursor += 1;
    }

    fn replace(&self, location: &Location) {
        let mut entries = self.lock();
        let cursor = entries.cursor;
        entries.stack[cursor] = location.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_truncates_forward_entries() {
        let history = ShellHistory::new(Location::root());
        history.push(&Location::new("/a"));
        history.push(&Location::new("/b"));
        assert!(history.back());
        history.push(&Location::new("/c"));

        assert_eq!(history.entry_count(), 3);
        assert_eq!(history.current_location(), Location::new("/c"));
        assert!(!history.forward());
    }

    #[test]
    fn replace_overwrites_the_cursor_entry() {
        let history = ShellHistory::new(Location::root());
        history.push(&Location::new("/a"));
        history.replace(&Location::new("/a2"));

        assert_eq!(history.entry_count(), 2);
        assert_eq!(history.current_location(), Location::new("/a2"));
        assert!(history.back());
        assert_eq!(history.current_location(), Location::root());
    }

    #[test]
    fn back_at_the_oldest_entry_does_not_move() {
        let history = ShellHistory::new(Location::root());
        assert!(!history.back());
        assert_eq!(history.current_location(), Location::root());
    }

    #[test]
    fn back_and_forward_walk_the_stack() {
        let history = ShellHistory::new(Location::root());
        history.push(&Location::new("/a"));
        history.push(&Location::new("/b"));

        assert!(history.back());
        assert_eq!(history.current_location(), Location::new("/a"));
        assert!(history.forward());
        assert_eq!(history.current_location(), Location::new("/b"));
    }
}
