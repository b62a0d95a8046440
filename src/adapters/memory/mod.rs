//! In-memory adapters for dry runs, replays and tests.

pub mod clock;
pub mod filesystem;

pub use clock::ManualClock;
pub use filesystem::{FsOp, MemoryFileSystem};
