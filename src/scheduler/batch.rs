//! Session batch and the menu cursor over it

use crate::types::GestureId;

/// Fixed, ordered set of gestures recorded in one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBatch {
    ids: Vec<GestureId>,
}

impl SessionBatch {
    pub(crate) fn new(ids: Vec<GestureId>) -> Self {
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GestureId> {
        self.ids.get(index)
    }

    pub fn as_slice(&self) -> &[GestureId] {
        &self.ids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GestureId> {
        self.ids.iter()
    }

    pub fn contains(&self, id: &GestureId) -> bool {
        self.ids.contains(id)
    }

    /// Cursor starting at the first gesture.
    pub fn cursor(&self) -> BatchCursor {
        BatchCursor { index: 0, len: self.ids.len() }
    }
}

impl<'a> IntoIterator for &'a SessionBatch {
    type Item = &'a GestureId;
    type IntoIter = std::slice::Iter<'a, GestureId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// Selected gesture on the menu screen, clamped to `[0, len - 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCursor {
    index: usize,
    len: usize,
}

impl BatchCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Jump to `index`, clamped to the last gesture.
    pub fn select(&mut self, index: usize) -> usize {
        self.index = index.min(self.len.saturating_sub(1));
        self.index
    }

    /// Move forward one gesture; stays put on the last.
    pub fn next(&mut self) -> usize {
        if self.index + 1 < self.len {
            self.index += 1;
        }
        self.index
    }

    /// Move back one gesture; stays put on the first.
    pub fn prev(&mut self) -> usize {
        self.index = self.index.saturating_sub(1);
        self.index
    }

    pub fn current<'a>(&self, batch: &'a SessionBatch) -> Option<&'a GestureId> {
        batch.get(self.index)
    }
}
