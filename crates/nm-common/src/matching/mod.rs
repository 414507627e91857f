pub mod location;
pub mod must_match;
pub mod pipeline;
pub mod scoring;
pub mod weights;

pub use location::{evaluate_location, LocationEvaluation, LocationMatch};
pub use must_match::{passes_must_match_filters, run_must_match_filters, FilterDecision, MustMatchResult};
pub use pipeline::{badge_priority, MatchingEngine, RankedCandidate, SelectionConfig};
pub use scoring::{compute_match_score, MatchScore, SectionScore};
