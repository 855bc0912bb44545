mod check_result;
pub use check_result::{CheckResult, UnknownResultCode};

mod invocation;
pub use invocation::{Invocation, UsageError};

/// Discrete competition time unit (a "tick").
///
/// Flags and flag checks are indexed by round number.
pub type Round = u64;

/// Network number of a competing team.
///
/// Encoded in two bytes inside every flag, hence `u16`.
pub type TeamId = u16;
