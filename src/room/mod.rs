//! Game rooms, the room table and duel matchmaking

pub mod instance;
pub mod matchmaker;
pub mod registry;

pub use instance::{Participant, Room, RoomStatus};
pub use matchmaker::{DuelRequest, Matchmaker};
pub use registry::RoomRegistry;
