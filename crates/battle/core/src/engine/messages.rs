use std::collections::VecDeque;

/// Lines currently shown in the battle help/message window.
///
/// When full, pushing a line scrolls the oldest one out.
#[derive(Clone, Debug, Default)]
pub struct MessageWindow {
    lines: VecDeque<String>,
    capacity: usize,
}

impl MessageWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Removes the oldest displayed line.
    pub fn pop_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
