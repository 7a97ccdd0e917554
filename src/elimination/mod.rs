//! Elimination bracket builders.
//!
//! [`single`] builds bye-aware single-elimination brackets for any entrant
//! count >= 2; [`double`] builds winner/loser double-elimination brackets for
//! power-of-two fields. Both precompute immutable slot-routing tables at
//! construction; recording a result only ever touches match results and the
//! routed slots.

pub mod double;
pub mod single;

use serde::{Deserialize, Serialize};

pub use double::{DeLocation, DeMatch, DeRound, DeTeam, DoubleElimBracket, Winner};
pub use single::{BracketRound, ElimMatch, Entrant, SingleElimBracket, SlotRef};

/// One of the two participant slots of a match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    #[must_use]
    pub(crate) fn from_parity(index: usize) -> Self {
        if index % 2 == 0 { Self::First } else { Self::Second }
    }
}
