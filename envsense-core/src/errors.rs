//! Error Types for the Aggregation Core
//!
//! ## Design Philosophy
//!
//! Nothing in this crate's error taxonomy is fatal. Every variant describes a
//! bounded resource hitting its cap or a payload failing structural
//! validation, and every one of them has a documented absorption policy:
//!
//! - Capacity errors (`RegistryFull`, `LogFull`, `HistogramFull`,
//!   `ServiceTableFull`): the excess observation is dropped and the window
//!   continues. The error exists so the capacity check is an explicit,
//!   testable branch instead of an implicit array bound.
//! - `MalformedUuidList`: parsing of that advertised element stops; the rest
//!   of the window is unaffected.
//!
//! The feature row handed downstream is always structurally complete; a
//! window that hit every cap still produces 46 values. Division-by-zero
//! situations never surface as errors at all — the reductions substitute 0.
//!
//! Errors are `Copy` and carry at most a single machine word of context, so
//! returning them in the per-beacon hot path costs nothing.

use thiserror_no_std::Error;

/// Result type for accumulator operations.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Accumulation errors - every one is absorbed by the drop policy above.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    /// Device registry reached [`MAX_DEVICES`](crate::constants::MAX_DEVICES).
    ///
    /// The identifier stays untracked for the rest of the window: no
    /// observation log, no service tagging.
    #[error("device registry full")]
    RegistryFull,

    /// A device's observation log reached
    /// [`MAX_OBSERVATIONS`](crate::constants::MAX_OBSERVATIONS); the newest
    /// observation was dropped.
    #[error("observation log full")]
    LogFull,

    /// A histogram already tracks its maximum number of distinct values;
    /// the observation was counted nowhere.
    #[error("histogram full")]
    HistogramFull,

    /// The distinct-services table is full; the tag was dropped.
    #[error("service table full")]
    ServiceTableFull,

    /// A 16-bit UUID list whose byte length is not a multiple of two.
    #[error("malformed service uuid list (len {len})")]
    MalformedUuidList {
        /// Byte length of the offending list.
        len: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for AggregateError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::RegistryFull => defmt::write!(fmt, "device registry full"),
            Self::LogFull => defmt::write!(fmt, "observation log full"),
            Self::HistogramFull => defmt::write!(fmt, "histogram full"),
            Self::ServiceTableFull => defmt::write!(fmt, "service table full"),
            Self::MalformedUuidList { len } =>
                defmt::write!(fmt, "malformed service uuid list (len {})", len),
        }
    }
}
