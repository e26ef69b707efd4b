use log::warn;

/// Fixed-capacity sliding window over the most recent entries.
///
/// Entries append until the window fills, after which each push evicts
/// the oldest entry in place. Logical index 0 is always the oldest
/// retained entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DataWindow<T> {
    window_size: usize,
    data: Vec<T>,
    index: usize,
}

impl<T> DataWindow<T> {
    /// A window holding at most `window_size` entries, minimum one.
    pub fn new(window_size: usize) -> Self {
        if window_size == 0 {
            warn!("A zero-size data window is not usable; clamping to 1");
        }
        let window_size = window_size.max(1);
        Self {
            window_size,
            data: Vec::with_capacity(window_size),
            index: 0,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.data.len() < self.window_size {
            self.data.push(entry);
            return;
        }
        self.data[self.index] = entry;
        self.index = (self.index + 1) % self.window_size;
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = T>) {
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn get(&self, ind: usize) -> Option<&T> {
        if ind >= self.data.len() {
            return None;
        }
        self.data.get(self.true_index(ind))
    }

    /// Map a logical oldest-first index onto the backing storage.
    fn true_index(&self, ind: usize) -> usize {
        if self.data.len() < self.window_size {
            ind
        } else {
            (ind + self.index) % self.window_size
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.window_size
    }

    pub fn capacity(&self) -> usize {
        self.window_size
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.index = 0;
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.data.len()).filter_map(move |i| self.get(i))
    }
}

impl<T: Clone> DataWindow<T> {
    /// Entries oldest to newest as a plain vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}
