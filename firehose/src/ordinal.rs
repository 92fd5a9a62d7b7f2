/// Per-block total ordering counter.
///
/// Stamped on every ordering-sensitive event so the reader can rebuild the
/// relative order of events that were emitted from different call sites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ordinal(u64);

impl Ordinal {
    /// Increments the counter and returns the new value, so the first
    /// ordinal after a reset is `1`.
    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// The last value handed out, `0` right after a reset.
    pub const fn current(&self) -> u64 {
        self.0
    }

    /// Back to `0`.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
