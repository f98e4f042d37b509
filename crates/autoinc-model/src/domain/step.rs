use std::{fmt, num::NonZeroI64};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Non-zero increment between two consecutive sequence values.
///
/// A negative step produces a descending sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Step(NonZeroI64);

impl Step {
    /// Step of `+1`.
    pub const ONE: Step = match NonZeroI64::new(1) {
        Some(one) => Step(one),
        None => panic!("1 is non-zero"),
    };

    /// Create a step, rejecting zero.
    ///
    /// # Examples
    /// ```
    /// use autoinc_model::{ModelError, Step};
    ///
    /// assert_eq!(Step::new(-3).unwrap().get(), -3);
    /// assert_eq!(Step::new(0), Err(ModelError::ZeroStep));
    /// ```
    pub fn new(step: i64) -> Result<Self, ModelError> {
        NonZeroI64::new(step).map(Self).ok_or(ModelError::ZeroStep)
    }

    /// Returns the raw increment.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0.get()
    }

    /// Returns `true` if the sequence counts upwards.
    #[inline]
    pub const fn is_ascending(self) -> bool {
        self.0.get() > 0
    }

    /// Returns the value following `from`.
    ///
    /// `None` when the next value would leave the `i64` range in the
    /// direction of travel. The bound is checked before adding, so a wrapped
    /// value is never observed.
    ///
    /// # Examples
    /// ```
    /// use autoinc_model::Step;
    ///
    /// let step = Step::new(2).unwrap();
    /// assert_eq!(step.advance(4), Some(6));
    /// assert_eq!(step.advance(i64::MAX - 1), None);
    /// ```
    #[inline]
    pub const fn advance(self, from: i64) -> Option<i64> {
        from.checked_add(self.0.get())
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<i64> for Step {
    type Error = ModelError;
    fn try_from(step: i64) -> Result<Self, Self::Error> {
        Self::new(step)
    }
}

impl From<Step> for i64 {
    fn from(s: Step) -> Self {
        s.get()
    }
}

impl From<NonZeroI64> for Step {
    fn from(n: NonZeroI64) -> Self {
        Self(n)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
