pub mod fakes;
pub mod fixtures;

#[allow(unused_imports)]
pub use fakes::{FaultyStore, FlakyRepository, MemoryConnector, MemoryExternalStore};
#[allow(unused_imports)]
pub use fixtures::{TestEnv, chunk_stream};
