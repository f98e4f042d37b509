use std::fmt;

/// Why a generator stopped producing values.
///
/// Consumers observe every variant the same way: the sequence is exhausted
/// once the buffered values are drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// `stop()` was called or the parent token was cancelled.
    Cancelled,
    /// The next value would leave the `i64` range.
    Overflow,
    /// The generator was dropped while its producer was still running.
    Closed,
}

impl StopReason {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            StopReason::Cancelled => "cancelled",
            StopReason::Overflow => "overflow",
            StopReason::Closed => "closed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
