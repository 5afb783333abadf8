//! Formica Core Prelude: convenient imports for common usage.
//!
//! ```rust
//! use formica_core::prelude::*;
//! ```

pub use crate::types::{
    normalize_degrees, shortest_turn, AgentId, BoundingBox, EntityHandle, Field, FoodId, IdSequence,
    MarkerId, Position, Tick,
};

pub use crate::index::{IndexEntry, SpatialIndex};

pub use crate::roles::{
    resolve_attributes, Adjustments, AttributeSet, Level, RoleCounts, RoleTable,
};

pub use crate::error::{CoreError, CoreResult};
