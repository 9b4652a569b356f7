//! Awalé rule engine
//!
//! The board is twelve pits in a circle. Pits 0-5 belong to the first seat,
//! 6-11 to the second. A move picks up every seed from one of the mover's
//! pits and sows them counter-clockwise, skipping the pit it started from.
//! Landing in the opponent's row on a pit that now holds 2 or 3 seeds
//! captures it, along with the run of 2s and 3s behind it.

use crate::error::{ArenaError, ArenaResult, MoveRejection};
use crate::types::{GameOutcome, Seat};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of pits on the board
pub const PIT_COUNT: usize = 12;

/// Number of pits each seat owns
pub const PITS_PER_SIDE: usize = PIT_COUNT / 2;

/// Seeds placed in every pit of a new board
pub const DEFAULT_SEEDS_PER_PIT: u32 = 4;

/// What a committed move did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Pit the seeds were picked up from
    pub pit: usize,
    /// Pit the last seed landed in
    pub last_pit: usize,
    /// Seeds captured by this move
    pub captured: u32,
    /// Mover now holds more than half of the seeds
    pub winner: bool,
}

/// Twelve pits and two score stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pits: [u32; PIT_COUNT],
    scores: [u32; 2],
    total_seeds: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Standard opening position: four seeds in every pit
    pub fn new() -> Self {
        Self::with_seeds(DEFAULT_SEEDS_PER_PIT)
    }

    /// Opening position with `per_pit` seeds in every pit
    pub fn with_seeds(per_pit: u32) -> Self {
        Self::from_position([per_pit; PIT_COUNT], [0, 0])
    }

    /// Build a board from an explicit position
    ///
    /// The seed pool is whatever the position holds, so conservation is
    /// checked against this total from here on.
    pub fn from_position(pits: [u32; PIT_COUNT], scores: [u32; 2]) -> Self {
        let total_seeds = pits.iter().sum::<u32>() + scores.iter().sum::<u32>();
        Self {
            pits,
            scores,
            total_seeds,
        }
    }

    /// Range of pit indices owned by a seat
    pub fn side(seat: Seat) -> Range<usize> {
        match seat {
            Seat::First => 0..PITS_PER_SIDE,
            Seat::Second => PITS_PER_SIDE..PIT_COUNT,
        }
    }

    /// Seat owning a pit
    pub fn owner(pit: usize) -> Seat {
        if pit < PITS_PER_SIDE {
            Seat::First
        } else {
            Seat::Second
        }
    }

    /// Absolute pit index for a seat-relative pit number (1-6)
    pub fn pit_for(seat: Seat, number: u8) -> Option<usize> {
        if (1..=PITS_PER_SIDE as u8).contains(&number) {
            Some(Self::side(seat).start + number as usize - 1)
        } else {
            None
        }
    }

    pub fn pits(&self) -> &[u32; PIT_COUNT] {
        &self.pits
    }

    pub fn seeds(&self, pit: usize) -> u32 {
        self.pits.get(pit).copied().unwrap_or(0)
    }

    pub fn score(&self, seat: Seat) -> u32 {
        self.scores[seat.index()]
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    /// Size of the seed pool this board started with
    pub fn total_seeds(&self) -> u32 {
        self.total_seeds
    }

    /// Seeds currently accounted for (pits plus stores)
    pub fn seeds_accounted(&self) -> u32 {
        self.pits.iter().sum::<u32>() + self.scores.iter().sum::<u32>()
    }

    /// A score strictly above this wins
    pub fn victory_threshold(&self) -> u32 {
        self.total_seeds / 2
    }

    /// True when every pit of `seat` is empty
    pub fn is_famished(&self, seat: Seat) -> bool {
        Self::side(seat).all(|pit| self.pits[pit] == 0)
    }

    /// Seat holding more than half of the pool, if any
    pub fn winner(&self) -> Option<Seat> {
        Seat::ALL
            .into_iter()
            .find(|seat| self.score(*seat) > self.victory_threshold())
    }

    /// Basic checks that don't need a simulation
    fn check_pit(&self, seat: Seat, pit: usize) -> Result<(), MoveRejection> {
        if self.winner().is_some() {
            return Err(MoveRejection::GameOver);
        }
        if pit >= PIT_COUNT {
            return Err(MoveRejection::OutOfRange { pit });
        }
        if Self::owner(pit) != seat {
            return Err(MoveRejection::ForeignPit { pit });
        }
        if self.pits[pit] == 0 {
            return Err(MoveRejection::EmptyPit { pit });
        }
        Ok(())
    }

    /// Play a move on a copy, returning the resulting board
    ///
    /// A move that leaves the opponent without seeds is refused unless it
    /// sowed at least one seed into the opponent's row.
    pub fn simulate(&self, seat: Seat, pit: usize) -> Result<(Board, MoveOutcome), MoveRejection> {
        self.check_pit(seat, pit)?;

        let mut next = self.clone();
        let (last_pit, fed_opponent) = next.sow(seat, pit);
        let captured = next.capture(seat, last_pit);

        if next.is_famished(seat.opponent()) && !fed_opponent {
            return Err(MoveRejection::Famine);
        }

        let outcome = MoveOutcome {
            pit,
            last_pit,
            captured,
            winner: next.score(seat) > next.victory_threshold(),
        };
        Ok((next, outcome))
    }

    /// Validate and commit a move
    ///
    /// On any rejection the board is left exactly as it was.
    pub fn apply_move(&mut self, seat: Seat, pit: usize) -> ArenaResult<MoveOutcome> {
        let (next, outcome) = self.simulate(seat, pit).map_err(ArenaError::from)?;
        *self = next;
        Ok(outcome)
    }

    /// Pits `seat` may legally play right now
    pub fn legal_moves(&self, seat: Seat) -> Vec<usize> {
        Self::side(seat)
            .filter(|pit| self.simulate(seat, *pit).is_ok())
            .collect()
    }

    /// End the game by count
    ///
    /// Seeds left in each row go to that row's owner, then the larger store
    /// wins. Used when the player to move has no legal move.
    pub fn settle(&mut self) -> GameOutcome {
        for seat in Seat::ALL {
            let remaining: u32 = Self::side(seat).map(|pit| self.pits[pit]).sum();
            for pit in Self::side(seat) {
                self.pits[pit] = 0;
            }
            self.scores[seat.index()] += remaining;
        }

        let [first, second] = self.scores;
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => GameOutcome::Victory {
                winner: Seat::First,
            },
            std::cmp::Ordering::Less => GameOutcome::Victory {
                winner: Seat::Second,
            },
            std::cmp::Ordering::Equal => GameOutcome::Draw,
        }
    }

    /// Distribute the seeds of `origin`; returns the landing pit and whether
    /// any seed reached the opponent's row
    fn sow(&mut self, seat: Seat, origin: usize) -> (usize, bool) {
        let mut seeds = self.pits[origin];
        self.pits[origin] = 0;

        let mut position = origin;
        let mut fed_opponent = false;
        while seeds > 0 {
            position = (position + 1) % PIT_COUNT;
            if position == origin {
                continue;
            }
            self.pits[position] += 1;
            seeds -= 1;
            if Self::owner(position) != seat {
                fed_opponent = true;
            }
        }

        (position, fed_opponent)
    }

    /// Capture backward from `last_pit` while in the opponent's row
    fn capture(&mut self, seat: Seat, last_pit: usize) -> u32 {
        let opponent_side = Self::side(seat.opponent());
        let mut position = last_pit;
        let mut captured = 0;

        while opponent_side.contains(&position) && matches!(self.pits[position], 2 | 3) {
            captured += self.pits[position];
            self.pits[position] = 0;
            if position == opponent_side.start {
                break;
            }
            position -= 1;
        }

        self.scores[seat.index()] += captured;
        captured
    }
}
