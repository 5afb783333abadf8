//! # Formica Core
//!
//! Shared building blocks for the Formica colony simulation:
//!
//! - **Types**: positions, bounding boxes, headings, and the typed ids
//!   that entities are known by
//! - **Spatial index**: an R-tree of bounding boxes behind a read/write
//!   lock, safe to query from many worker threads at once
//! - **Roles**: ordinal attribute adjustments and the fixed lookup
//!   tables that turn them into concrete agent attributes
//!
//! ## Quick Start
//!
//! ```rust
//! use formica_core::prelude::*;
//!
//! let index = SpatialIndex::new();
//! let home = BoundingBox::centered(Position::new(400.0, 300.0), 32.0, 32.0);
//! index.insert(home, EntityHandle::Home);
//!
//! let probe = BoundingBox::around(Position::new(420.0, 300.0), 10.0);
//! assert_eq!(index.handles_in(probe), vec![EntityHandle::Home]);
//!
//! let scout = RoleTable::standard().attributes_for("scout", 500.0);
//! assert_eq!(scout.speed, 6.0);
//! ```

pub mod error;
pub mod index;
pub mod prelude;
pub mod roles;
pub mod types;
