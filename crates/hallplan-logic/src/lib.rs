//! Pure building layout logic for HallPlan.
//!
//! This crate contains everything about a residence hall's floor plan that is
//! independent of storage, transport, or UI. Functions take plain data and
//! return results, so the authoring editor, the browsing view, and the
//! headless harness all share one implementation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`shape`] | Footprint configuration (single/L/U/square), wing presence, validation |
//! | [`grid`] | Browsing and authoring grid generation, grid memoization |
//! | [`slot`] | Slot keys, room number ↔ slot codec, base-26 row letters |
//! | [`placement`] | Authoring placements, shape-edit pruning, committed layout record |
//! | [`occupancy`] | Room/occupant/request overlay for browsing, request lifecycle |

pub mod grid;
pub mod occupancy;
pub mod placement;
pub mod shape;
pub mod slot;
