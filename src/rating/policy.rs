//! ELO adjustment after a decided game
//!
//! The default is a flat exchange of 30 points. The dynamic policy runs the
//! standard Elo update from the skillratings crate with a configurable K.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use skillratings::elo::{elo, EloConfig, EloRating};
use skillratings::Outcomes;

/// Default points exchanged under the fixed policy
pub const DEFAULT_ELO_DELTA: i32 = 30;

/// How ratings move when a game is decided
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EloPolicy {
    /// Winner gains `delta`, loser loses `delta`
    Fixed { delta: i32 },
    /// Standard Elo with the given K-factor
    Dynamic { k_factor: f64 },
}

impl Default for EloPolicy {
    fn default() -> Self {
        EloPolicy::Fixed {
            delta: DEFAULT_ELO_DELTA,
        }
    }
}

/// Rating deltas for both sides of a decided game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingChange {
    pub winner_delta: i32,
    pub loser_delta: i32,
}

impl EloPolicy {
    /// Validate policy parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        match self {
            EloPolicy::Fixed { delta } if *delta < 0 => {
                Err(anyhow!("Fixed ELO delta must not be negative, got {}", delta))
            }
            EloPolicy::Dynamic { k_factor } if !(k_factor.is_finite() && *k_factor > 0.0) => {
                Err(anyhow!("ELO K-factor must be positive, got {}", k_factor))
            }
            _ => Ok(()),
        }
    }

    /// Compute the deltas for a game `winner_elo` won against `loser_elo`
    pub fn rating_change(&self, winner_elo: i32, loser_elo: i32) -> RatingChange {
        match self {
            EloPolicy::Fixed { delta } => RatingChange {
                winner_delta: *delta,
                loser_delta: -*delta,
            },
            EloPolicy::Dynamic { k_factor } => {
                let winner = EloRating {
                    rating: winner_elo as f64,
                };
                let loser = EloRating {
                    rating: loser_elo as f64,
                };
                let config = EloConfig { k: *k_factor };
                let (new_winner, new_loser) = elo(&winner, &loser, &Outcomes::WIN, &config);

                RatingChange {
                    winner_delta: (new_winner.rating - winner.rating).round() as i32,
                    loser_delta: (new_loser.rating - loser.rating).round() as i32,
                }
            }
        }
    }
}
