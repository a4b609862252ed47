//! Services - components that drive recorders
//!
//! - `reporter` - Per-window snapshot, log and reset cycle
//! - `load_generator` - Synthetic request load for end-to-end runs

pub mod load_generator;
pub mod reporter;

// Re-export commonly used types
pub use load_generator::LoadProfile;
pub use reporter::{Reporter, WindowSnapshot};
