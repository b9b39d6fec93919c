use crate::error::{Error, Result};

/// A queued image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// Ordered image references plus the cursor of the displayed one.
///
/// Invariants: an empty queue has no cursor; a cursor always points inside
/// the queue.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    entries: Vec<QueueEntry>,
    cursor: Option<usize>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|i| self.entries.get(i))
    }

    /// Appends an entry and returns its index.
    pub fn push(&mut self, entry: QueueEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn set_cursor(&mut self, index: usize) -> Result<()> {
        self.check(index)?;
        self.cursor = Some(index);
        Ok(())
    }

    /// Removes the entry at `index`.
    ///
    /// A cursor at or after `index` moves back by one so it keeps naming the
    /// same image; when the displayed image itself is removed the cursor lands
    /// on its predecessor, or on the new first entry if it was first.
    pub fn remove(&mut self, index: usize) -> Result<QueueEntry> {
        self.check(index)?;
        let entry = self.entries.remove(index);
        self.cursor = match self.cursor {
            _ if self.entries.is_empty() => None,
            Some(c) if index <= c => Some(c.saturating_sub(1)),
            other => other,
        };
        Ok(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(Error::OutOfRange {
                index,
                len: self.entries.len(),
            })
        }
    }
}
