#![no_std] // The decomposition types carry no OS dependencies

extern crate alloc;

// Enable std if the feature is active (for tests/tools)
#[cfg(feature = "std")]
extern crate std;

pub mod ids;
pub mod tags;

// Re-export core types for convenience
pub use ids::{ClauseId, TokenId};
pub use tags::*;

pub mod model;
pub use model::*;
