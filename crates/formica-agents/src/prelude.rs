//! Convenience re-exports.

pub use crate::forager::{Forager, ForagerFactory, ForagerSettings};
pub use crate::wanderer::{Wanderer, WandererFactory};
