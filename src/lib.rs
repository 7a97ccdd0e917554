//! # Tourney
//!
//! A tournament pairing and bracket engine.
//!
//! The engine generates match pairings for successive rounds under four
//! formats and tracks participant state across rounds:
//!
//! - **Swiss system** ([`swiss`]): score-group pairing with rematch
//!   avoidance, color alternation, fair byes, and Buchholz tie-breaks.
//! - **Round-robin** ([`round_robin`]): circle-method schedules, rebuilt
//!   standings with head-to-head tie-breaks.
//! - **Single elimination** ([`elimination::single`]): bye-aware brackets
//!   with precomputed slot routing.
//! - **Double elimination** ([`elimination::double`]): interacting winner
//!   and loser brackets routed into a grand final.
//! - **Swiss → double elimination** ([`swiss_de`]): a hybrid that qualifies
//!   teams through Swiss play into a double-elimination playoff.
//!
//! Every operation is a pure function: it consumes the current aggregate and
//! returns a new one, so callers can replay, undo, or re-derive state.
//! Randomness and pairing deadlines are injected, which makes every outcome
//! reproducible in tests.
//!
//! ## Example
//!
//! ```
//! use tourney::{Registrant, RoundRobin, round_robin::PointsConfig};
//!
//! let roster = [
//!     Registrant::new("alpha"),
//!     Registrant::new("bravo"),
//!     Registrant::new("charlie"),
//!     Registrant::new("delta"),
//! ];
//! let tournament = RoundRobin::start(&roster, PointsConfig::default()).unwrap();
//! assert_eq!(tournament.rounds.len(), 3);
//! ```

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

pub mod elimination;
pub mod error;
pub mod roster;
pub mod round_robin;
pub mod swiss;
pub mod swiss_de;

pub use elimination::{DoubleElimBracket, SingleElimBracket};
pub use error::TournamentError;
pub use roster::{EntrantId, Registrant};
pub use round_robin::RoundRobin;
pub use swiss::SwissTournament;
pub use swiss_de::SwissDe;

/// Completion query shared by every format, dispatched without dynamic
/// allocation via `enum_dispatch`.
#[enum_dispatch]
pub trait Progress {
    /// The tournament has reached its terminal state.
    fn is_complete(&self) -> bool;
}

impl Progress for SwissTournament {
    fn is_complete(&self) -> bool {
        SwissTournament::is_complete(self)
    }
}

impl Progress for RoundRobin {
    fn is_complete(&self) -> bool {
        RoundRobin::is_complete(self)
    }
}

impl Progress for SingleElimBracket {
    fn is_complete(&self) -> bool {
        SingleElimBracket::is_complete(self)
    }
}

impl Progress for DoubleElimBracket {
    fn is_complete(&self) -> bool {
        DoubleElimBracket::is_complete(self)
    }
}

impl Progress for SwissDe {
    fn is_complete(&self) -> bool {
        self.phase == swiss_de::Phase::Finished
    }
}

/// A tournament of any supported format, for callers that manage a
/// heterogeneous collection of events.
#[enum_dispatch(Progress)]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum AnyTournament {
    Swiss(SwissTournament),
    RoundRobin(RoundRobin),
    SingleElimination(SingleElimBracket),
    DoubleElimination(DoubleElimBracket),
    SwissDe(SwissDe),
}
