/// Index of the current track in the playlist, or `None` while the
/// playlist is empty.
///
/// Every operation takes the playlist length so the cursor never has to
/// hold on to the playlist itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    index: Option<usize>,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Restores the invariant for a playlist of `len` tracks: empty means no
    /// cursor, and a missing or out of range cursor falls back to the first
    /// track. Returns true if the cursor moved.
    pub fn resolve(&mut self, len: usize) -> bool {
        let resolved = match self.index {
            _ if len == 0 => None,
            Some(index) if index < len => Some(index),
            _ => Some(0),
        };
        let changed = resolved != self.index;
        self.index = resolved;
        changed
    }

    /// Points at `index` if it is inside the playlist. Reselecting the
    /// current index is accepted and leaves the cursor as it was.
    pub fn select_index(&mut self, index: usize, len: usize) -> bool {
        if index >= len {
            return false;
        }
        self.index = Some(index);
        true
    }

    pub fn next(&mut self, len: usize) -> Option<usize> {
        self.resolve(len);
        self.index = self.index.map(|current| (current + 1) % len);
        self.index
    }

    pub fn previous(&mut self, len: usize) -> Option<usize> {
        self.resolve(len);
        self.index = self.index.map(|current| (current + len - 1) % len);
        self.index
    }
}
