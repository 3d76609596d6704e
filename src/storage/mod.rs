//! Settings storage abstraction.
//!
//! - `traits`: the [`ConfigStore`] interface the host system implements
//! - `memory`: a `DashMap`-backed implementation

mod memory;
mod traits;

pub use memory::MemoryConfigStore;
pub use traits::{ConfigStore, NAMESPACE};
