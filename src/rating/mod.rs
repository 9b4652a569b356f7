//! Rating updates for decided games

pub mod policy;

pub use policy::{EloPolicy, RatingChange, DEFAULT_ELO_DELTA};
