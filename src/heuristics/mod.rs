//! Heuristics module.
//!
//! The branch search engine (perimeter, branches, coordinator) and the construction
//! heuristics built on top of it.

pub mod perimeter;
pub mod branch;
pub mod terminal;
pub mod search;
pub mod construction;

pub use branch::{Branch, BranchConfig, InsertionCandidate, PointStatus, TourBranch};
pub use construction::*;
pub use perimeter::{build_perimeter, Perimeter};
pub use search::{Ranked, SearchConfig, SearchCoordinator};
pub use terminal::TerminalBranch;
