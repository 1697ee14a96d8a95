//! Public runtime API surface.
//!
//! Types exposed to consumers of the runtime crate live here so the engine,
//! repositories, and workers can stay focused on their own concerns.

pub mod errors;
pub mod gate;
pub mod snapshot;

pub use errors::{Result, RuntimeError};
pub use gate::ChangeGate;
pub use snapshot::WorldTierSnapshot;
