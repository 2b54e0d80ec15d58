use crate::usecase::ports::navigator::Navigator;

/// In-process address bar with a back/forward stack.
#[derive(Debug, Clone)]
pub struct HistoryLocation {
    entries: Vec<String>,
    index: usize,
}

impl HistoryLocation {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.trim_start_matches('?').to_string()],
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}

impl Default for HistoryLocation {
    fn default() -> Self {
        Self::new("")
    }
}

impl Navigator for HistoryLocation {
    fn location(&self) -> String {
        self.entries[self.index].clone()
    }

    fn replace(&mut self, query: &str) {
        self.entries[self.index] = query.to_string();
    }

    fn push(&mut self, query: &str) {
        if self.entries[self.index] == query {
            return;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(query.to_string());
        self.index += 1;
    }

    fn back(&mut self) -> Option<String> {
        if !self.can_go_back() {
            return None;
        }
        self.index -= 1;
        Some(self.location())
    }

    fn forward(&mut self) -> Option<String> {
        if !self.can_go_forward() {
            return None;
        }
        self.index += 1;
        Some(self.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_drops_forward_entries() {
        let mut history = HistoryLocation::new("?page=2");

        history.push("page=3");
        history.push("page=4");
        assert_eq!(history.back(), Some("page=3".to_string()));
        history.push("search=ann");

        assert_eq!(history.len(), 3);
        assert_eq!(history.forward(), None);
        assert_eq!(history.back(), Some("page=3".to_string()));
        assert_eq!(history.back(), Some("page=2".to_string()));
        assert_eq!(history.back(), None);
    }

    #[test]
    fn replace_keeps_history_length() {
        let mut history = HistoryLocation::default();

        history.replace("search=a");
        history.replace("search=an");

        assert_eq!(history.len(), 1);
        assert_eq!(history.location(), "search=an");
    }
}
