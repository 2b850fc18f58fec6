//! Fixed-capacity rolling history per channel.
//!
//! Every [`Window`] holds exactly `capacity` cells from the moment it is
//! created. Cells start out empty (`None`) and are shifted out from the front
//! as new samples are appended at the back, so index `0` is always the oldest
//! sample and the last index is "now".
//!
//! A [`WindowStore`] keys independent windows by channel name. Destroying one
//! channel never touches another channel's cells, so alignment across
//! surviving channels is preserved through entity churn.

use std::collections::{BTreeMap, VecDeque};

/// One cell of a window: a reading, or nothing for a missing sample.
pub type Sample = Option<f64>;

/// Rolling history for a single channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    cells: VecDeque<Sample>,
}

impl Window {
    /// A window of `capacity` empty cells. Zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cells: std::iter::repeat_n(None, capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Evict the oldest cell and append `value` as the newest.
    ///
    /// Non-finite readings are stored as missing.
    pub fn push(&mut self, value: Sample) {
        let value = value.filter(|v| v.is_finite());
        self.cells.pop_front();
        self.cells.push_back(value);
    }

    pub fn latest(&self) -> Sample {
        self.cells.back().copied().flatten()
    }

    /// Cells oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.cells.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Sample> {
        self.iter().collect()
    }

    fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().filter_map(|c| *c)
    }

    /// Largest present value, `None` when every cell is empty.
    pub fn max(&self) -> Option<f64> {
        self.present().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.present().reduce(f64::min)
    }

    pub fn mean(&self) -> Option<f64> {
        let (sum, n) = self.present().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if n == 0 { None } else { Some(sum / n as f64) }
    }

    /// Divide every present cell by `divisor`, keeping empty cells empty.
    pub fn scaled(&self, divisor: f64) -> Vec<Sample> {
        self.cells.iter().map(|c| c.map(|v| v / divisor)).collect()
    }
}

// ---------------------------------------------------------------------------
// WindowStore
// ---------------------------------------------------------------------------

/// Named windows of one shared capacity.
#[derive(Debug, Clone)]
pub struct WindowStore {
    capacity: usize,
    windows: BTreeMap<String, Window>,
}

impl WindowStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocate an empty window for `key`. Returns `false` if it already existed.
    pub fn create_channel(&mut self, key: &str) -> bool {
        if self.windows.contains_key(key) {
            return false;
        }
        self.windows.insert(key.to_string(), Window::new(self.capacity));
        true
    }

    /// Drop the window for `key`. Returns `false` if there was none.
    pub fn destroy_channel(&mut self, key: &str) -> bool {
        self.windows.remove(key).is_some()
    }

    /// Append a sample to `key`, creating the channel on first sight.
    pub fn push(&mut self, key: &str, value: Sample) {
        if !self.windows.contains_key(key) {
            log::debug!("window store: new channel {key}");
            self.create_channel(key);
        }
        if let Some(w) = self.windows.get_mut(key) {
            w.push(value);
        }
    }

    /// Current cells of `key`, oldest-first.
    pub fn snapshot(&self, key: &str) -> Option<Vec<Sample>> {
        self.windows.get(key).map(Window::to_vec)
    }

    pub fn window(&self, key: &str) -> Option<&Window> {
        self.windows.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.windows.contains_key(key)
    }

    /// Channel keys in sorted order.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Largest present value across the named channels.
    pub fn max_over<'a, I>(&self, keys: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .filter_map(|k| self.windows.get(k))
            .filter_map(Window::max)
            .reduce(f64::max)
    }
}
