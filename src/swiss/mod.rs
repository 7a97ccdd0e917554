//! Swiss-system engine: score-group pairing with rematch avoidance, color
//! alternation, fair byes, and Buchholz tie-breaks.
//!
//! Entry points:
//! - [`SwissTournament::start`] builds the aggregate and pairs round 0.
//! - [`SwissTournament::generate_next_round`] pairs the next round under an
//!   injected RNG and [`Deadline`].
//! - [`SwissTournament::apply_results`] records a round and recomputes
//!   tie-breaks.

pub mod pairing;
pub mod player;
pub mod tournament;

pub use pairing::{DEFAULT_PAIRING_BUDGET, Deadline, SwissMatch, SwissRound};
pub use player::{Color, MatchResult, Player, initialize_players};
pub use tournament::{SwissTournament, recalculate_buchholz};
