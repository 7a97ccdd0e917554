//! Engine-wide error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::swiss_de::Phase;

/// Errors reported by engine operations.
///
/// Validation errors reject the requested operation; they are never fatal to
/// the caller's process. [`TournamentError::PairingTimeout`] is the single
/// convergence error: the caller decides whether to retry, e.g. with a
/// different RNG seed.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum TournamentError {
    #[error("need {required}+ participants, got {actual}")]
    NotEnoughParticipants { required: usize, actual: usize },
    #[error("participant count must be a power of two, got {actual}")]
    NotPowerOfTwo { actual: usize },
    #[error("double elimination supports bracket sizes 4 and 8, got {actual}")]
    UnsupportedBracketSize { actual: usize },
    #[error("round {round} still has unreported results")]
    MissingResults { round: usize },
    #[error("pairing deadline exceeded")]
    PairingTimeout,
    #[error("qualifier count must be a power of two, got {actual}")]
    QualifierCountNotPowerOfTwo { actual: usize },
    #[error("operation requires the {expected} phase, tournament is in {actual}")]
    InvalidPhase { expected: Phase, actual: Phase },
    #[error("swiss stage is not complete")]
    SwissStageIncomplete,
    #[error("bracket reset is not available")]
    BracketResetUnavailable,
}
