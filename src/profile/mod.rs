//! Player profiles: bios, ratings and friendships

pub mod flat_file;
pub mod memory;
pub mod store;

pub use flat_file::FlatFileProfileStore;
pub use memory::{InMemoryProfileStore, ProfileData};
pub use store::{is_valid_bio, ProfileStore, DEFAULT_ELO, MAX_BIO_LENGTH};

#[cfg(test)]
pub use store::MockProfileStore;
