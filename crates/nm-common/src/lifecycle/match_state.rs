use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the match is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Host,
    Nanny,
}

/// The decision a party submits through a review link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Proceed,
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Proceeded,
    Passed,
}

impl MatchStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(MatchStatus::Pending),
            "proceeded" => Some(MatchStatus::Proceeded),
            "passed" => Some(MatchStatus::Passed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Proceeded => "proceeded",
            MatchStatus::Passed => "passed",
        }
    }
}

/// Decision-relevant slice of a Match record. The transition function
/// below is the sole writer of these fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionState {
    pub status: MatchStatus,
    pub host_proceed: Option<bool>,
    pub nanny_proceed: Option<bool>,
    pub both_proceed_at: Option<DateTime<Utc>>,
}

impl DecisionState {
    pub fn pending() -> Self {
        Self {
            status: MatchStatus::Pending,
            host_proceed: None,
            nanny_proceed: None,
            both_proceed_at: None,
        }
    }

    fn flag(&self, party: Party) -> Option<bool> {
        match party {
            Party::Host => self.host_proceed,
            Party::Nanny => self.nanny_proceed,
        }
    }

    fn other_flag(&self, party: Party) -> Option<bool> {
        match party {
            Party::Host => self.nanny_proceed,
            Party::Nanny => self.host_proceed,
        }
    }

    fn with_flag(mut self, party: Party, value: bool) -> Self {
        match party {
            Party::Host => self.host_proceed = Some(value),
            Party::Nanny => self.nanny_proceed = Some(value),
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: DecisionState,
    /// True exactly when this transition made the match mutual, i.e. the
    /// second proceed just landed. The caller creates the conversation
    /// and unlocks scheduling on this edge only.
    pub newly_mutual: bool,
    /// False for idempotent re-submissions; nothing needs persisting.
    pub changed: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    /// A resolved match only accepts an identical re-submission.
    #[error("match already resolved as {status}", status = .0.as_str())]
    AlreadyResolved(MatchStatus),
}

/// The single legal-transition function for the proceed/pass machine.
///
/// - `pending` + proceed: records the flag; when the other side already
///   proceeded the match resolves to `proceeded` and `both_proceed_at`
///   is stamped.
/// - `pending` + pass: resolves to `passed` immediately. One pass vetoes
///   the match regardless of the other side.
/// - resolved states: re-submitting the same choice by a party whose
///   flag already reflects it is a harmless no-op; a pass on an already
///   passed match records the second veto; anything contrary is
///   rejected. In particular proceed-after-pass does not reopen the
///   match.
pub fn apply_choice(
    state: &DecisionState,
    party: Party,
    choice: Choice,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionError> {
    match (state.status, choice) {
        (MatchStatus::Pending, Choice::Proceed) => {
            if state.flag(party) == Some(true) {
                return Ok(Transition {
                    state: *state,
                    newly_mutual: false,
                    changed: false,
                });
            }

            let mut next = state.with_flag(party, true);
            let newly_mutual = next.other_flag(party) == Some(true);
            if newly_mutual {
                next.status = MatchStatus::Proceeded;
                next.both_proceed_at = Some(now);
            }

            Ok(Transition {
                state: next,
                newly_mutual,
                changed: true,
            })
        }
        (MatchStatus::Pending, Choice::Pass) => {
            let mut next = state.with_flag(party, false);
            next.status = MatchStatus::Passed;

            Ok(Transition {
                state: next,
                newly_mutual: false,
                changed: true,
            })
        }
        (MatchStatus::Proceeded, Choice::Proceed) => Ok(Transition {
            state: *state,
            newly_mutual: false,
            changed: false,
        }),
        (MatchStatus::Proceeded, Choice::Pass) => {
            Err(TransitionError::AlreadyResolved(MatchStatus::Proceeded))
        }
        (MatchStatus::Passed, Choice::Pass) => {
            if state.flag(party) == Some(false) {
                return Ok(Transition {
                    state: *state,
                    newly_mutual: false,
                    changed: false,
                });
            }

            // The other party joins the veto; the status cannot change.
            Ok(Transition {
                state: state.with_flag(party, false),
                newly_mutual: false,
                changed: true,
            })
        }
        (MatchStatus::Passed, Choice::Proceed) => {
            Err(TransitionError::AlreadyResolved(MatchStatus::Passed))
        }
    }
}
