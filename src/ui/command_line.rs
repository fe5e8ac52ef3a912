//! State of the command field and its autocomplete tooltip.

use crate::domain::{COMMAND_PREFIX, predict};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandLine {
    text: String,
    focused: bool,
    /// Opened with the help button, independent of what is typed
    help_open: bool,
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Losing focus closes the tooltip, including one opened from the help button
    pub fn blur(&mut self) {
        self.focused = false;
        self.help_open = false;
    }

    pub fn toggle_help(&mut self) {
        self.help_open = !self.help_open;
    }

    pub fn tooltip_visible(&self) -> bool {
        self.help_open || (self.focused && self.text.starts_with(COMMAND_PREFIX))
    }

    /// Suggestions for the current text
    pub fn predictions(&self) -> Vec<String> {
        predict(&self.text)
    }

    /// Clear the field and hand back what was typed. Blank input yields nothing.
    pub fn take_submission(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.text);
        (!text.trim().is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NO_COMMANDS_FOUND;

    #[test]
    fn test_tooltip_visibility() {
        let mut line = CommandLine::new();
        line.set_text("/pe");
        assert!(!line.tooltip_visible());

        line.focus();
        assert!(line.tooltip_visible());
        assert_eq!(line.predictions(), vec!["/perft <depth>"]);

        line.set_text("e4");
        assert!(!line.tooltip_visible());
        line.set_text("");
        assert!(!line.tooltip_visible());

        line.set_text("/zz");
        assert_eq!(line.predictions(), vec![NO_COMMANDS_FOUND]);
        line.blur();
        assert!(!line.tooltip_visible());
    }

    #[test]
    fn test_help_toggle() {
        let mut line = CommandLine::new();
        line.toggle_help();
        assert!(line.tooltip_visible());
        line.toggle_help();
        assert!(!line.tooltip_visible());

        line.focus();
        line.toggle_help();
        line.blur();
        assert!(!line.tooltip_visible());
    }

    #[test]
    fn test_take_submission() {
        let mut line = CommandLine::new();
        line.set_text("/undo");
        assert_eq!(line.take_submission().as_deref(), Some("/undo"));
        assert_eq!(line.text(), "");

        line.set_text("   ");
        assert_eq!(line.take_submission(), None);
        assert_eq!(line.text(), "");
    }
}
