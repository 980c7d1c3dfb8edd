//! Branch TSP Solver Library
//!
//! A Euclidean TSP heuristic engine. Tours start from the convex perimeter of the
//! instance and grow by cheapest insertion; when a point has several competing
//! options the branch forks, and a best-first [`SearchCoordinator`] explores the
//! resulting forest of partial tours until its best branch is complete and locally
//! optimal.
//!
//! # Features
//!
//! - Clone-aware candidate heap with bulk rewrite ([`queue::CandidateQueue`])
//! - Incremental tour branches with relocation of already placed points
//! - Bounded forest search with pruning by completion-normalized length
//! - TSPLIB I/O, benchmarking and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use branch_tsp_solver::instance::TSPInstance;
//! use branch_tsp_solver::heuristics::construction::{BranchSearchHeuristic, ConstructionHeuristic};
//!
//! let instance = TSPInstance::from_file("instance.tsp").unwrap();
//!
//! let search = BranchSearchHeuristic::forking(Some(32));
//! let solution = search.construct(&instance);
//!
//! println!("Tour length: {:.2}", solution.cost);
//! ```

pub mod error;
pub mod config;
pub mod logging;
pub mod instance;
pub mod geometry;
pub mod queue;
pub mod solution;
pub mod heuristics;
pub mod benchmark;
pub mod visualization;

pub use error::{Error, Result};
pub use heuristics::search::SearchCoordinator;
pub use instance::TSPInstance;
pub use solution::Solution;
