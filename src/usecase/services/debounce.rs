use std::time::{Duration, Instant};

use crate::domain::search::preprocess_search;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Identifies one armed timer. Firing a ticket that has since been replaced
/// by a newer keystroke does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket(u64);

/// Keeps the visible search text in step with every keystroke while the
/// committed search term only changes once input pauses.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    delay: Duration,
    local: String,
    committed: String,
    armed: Option<(DebounceTicket, Instant)>,
    next_ticket: u64,
}

impl SearchDebouncer {
    pub fn new(initial: &str) -> Self {
        Self::with_delay(initial, SEARCH_DEBOUNCE)
    }

    pub fn with_delay(initial: &str, delay: Duration) -> Self {
        Self {
            delay,
            local: initial.to_string(),
            committed: initial.to_string(),
            armed: None,
            next_ticket: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Text shown in the input box.
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Records a keystroke and restarts the timer.
    pub fn input(&mut self, text: &str, now: Instant) -> DebounceTicket {
        self.local = text.to_string();
        self.next_ticket += 1;
        let ticket = DebounceTicket(self.next_ticket);
        self.armed = Some((ticket, now + self.delay));
        ticket
    }

    /// Commits the sanitized local text if `ticket` is still the armed timer.
    pub fn fire(&mut self, ticket: DebounceTicket) -> Option<String> {
        match self.armed {
            Some((armed, _)) if armed == ticket => {
                self.armed = None;
                self.committed = preprocess_search(&self.local);
                Some(self.committed.clone())
            }
            _ => None,
        }
    }

    /// Drops the armed timer and puts the committed term back in the box.
    /// Returns whether a timer was pending.
    pub fn cancel(&mut self) -> bool {
        self.local = self.committed.clone();
        self.armed.take().is_some()
    }

    /// Adopts a search term that changed elsewhere (back navigation, reset).
    /// Ignored while the user is typing and when it echoes our own commit.
    pub fn sync_external(&mut self, value: &str) -> bool {
        if self.armed.is_some() || value == self.committed {
            return false;
        }
        self.local = value.to_string();
        self.committed = value.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rapid_typing_commits_once_with_final_text() {
        let start = Instant::now();
        let mut debouncer = SearchDebouncer::new("");

        let tickets: Vec<_> = ["J", "Jo", "Joh", "John", "John "]
            .iter()
            .enumerate()
            .map(|(step, text)| {
                let ticket = debouncer.input(text, start + Duration::from_millis(80 * step as u64));
                assert_eq!(debouncer.local(), *text);
                ticket
            })
            .collect();
        let commits: Vec<String> = tickets
            .into_iter()
            .filter_map(|ticket| debouncer.fire(ticket))
            .collect();

        assert_eq!(commits, vec!["John".to_string()]);
    }

    #[test]
    fn replaced_ticket_does_not_fire() {
        let now = Instant::now();
        let mut debouncer = SearchDebouncer::new("");

        let first = debouncer.input("a", now);
        let second = debouncer.input("ab", now);

        assert_eq!(debouncer.fire(first), None);
        assert_eq!(debouncer.fire(second), Some("ab".to_string()));
        assert_eq!(debouncer.fire(second), None);
    }

    #[test]
    fn commit_is_sanitized() {
        let now = Instant::now();
        let mut debouncer = SearchDebouncer::new("");

        let ticket = debouncer.input("  John  Doe<script>", now);

        assert_eq!(debouncer.fire(ticket), Some("John Doe".to_string()));
        assert_eq!(debouncer.local(), "  John  Doe<script>");
    }

    #[test]
    fn external_change_does_not_stomp_typing() {
        let now = Instant::now();
        let mut debouncer = SearchDebouncer::new("ann");

        let ticket = debouncer.input("anna", now);
        assert!(!debouncer.sync_external(""));
        assert_eq!(debouncer.local(), "anna");

        debouncer.fire(ticket);
        assert!(!debouncer.sync_external("anna"));
        assert!(debouncer.sync_external("bob"));
        assert_eq!(debouncer.local(), "bob");
    }

    #[test]
    fn cancel_disarms_the_pending_timer() {
        let now = Instant::now();
        let mut debouncer = SearchDebouncer::new("ann");

        let ticket = debouncer.input("annabel", now);
        assert!(debouncer.cancel());
        assert_eq!(debouncer.local(), "ann");
        assert_eq!(debouncer.fire(ticket), None);
        assert!(!debouncer.cancel());

        assert!(debouncer.sync_external(""));
        assert_eq!(debouncer.local(), "");
    }
}
