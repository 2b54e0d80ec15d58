/// The externally visible query string of the current screen.
pub trait Navigator {
    /// Current query string without the leading `?`.
    fn location(&self) -> String;

    /// Replaces the current entry; must not grow history on every keystroke.
    fn replace(&mut self, query: &str);

    /// Pushes a new entry so back navigation can return to the old one.
    fn push(&mut self, query: &str) {
        self.replace(query);
    }

    fn back(&mut self) -> Option<String> {
        None
    }

    fn forward(&mut self) -> Option<String> {
        None
    }
}
