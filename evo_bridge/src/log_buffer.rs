//! Bounded replay buffer for control process output.
//!
//! Late-joining observers receive the buffered text as a single input
//! event. The buffer keeps the most recent `capacity` characters (Unicode
//! scalar values, not bytes); older text is dropped from the front.

/// Suffix-truncating text buffer.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    text: String,
    /// Character count of `text`.
    chars: usize,
    capacity: usize,
}

impl LogBuffer {
    /// Empty buffer holding at most `capacity` characters.
    pub fn new(capacity: usize) -> Self {
        Self {
            text: String::new(),
            chars: 0,
            capacity,
        }
    }

    /// Append `chunk`, dropping the oldest characters beyond capacity.
    pub fn push(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        self.chars += chunk.chars().count();

        if self.chars > self.capacity {
            let excess = self.chars - self.capacity;
            let cut = self
                .text
                .char_indices()
                .nth(excess)
                .map_or(self.text.len(), |(index, _)| index);
            self.text.drain(..cut);
            self.chars = self.capacity;
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.text.clear();
        self.chars = 0;
    }

    /// Buffered text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Buffered character count.
    pub fn len(&self) -> usize {
        self.chars
    }

    /// `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }

    /// Maximum character count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
