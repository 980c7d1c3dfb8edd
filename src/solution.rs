//! Solution representation for the branch search.
//!
//! A [`Solution`] is the finished product handed to the CLI, the benchmark and the
//! visualizer: the visiting order plus the counters of the search that produced it.

use crate::error::Result;
use crate::instance::TSPInstance;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Represents a closed tour found by a search run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a sequence of point ids; the closing edge back to `tour[0]` is implied
    pub tour: Vec<usize>,
    /// Total tour length
    pub cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Coordinator advances performed
    pub iterations: usize,
    /// Branches forked during the search
    pub clone_count: usize,
    /// Branches discarded by the clone ceiling
    pub pruned_count: usize,
    /// Whether the search reached a terminal branch before its iteration limit
    pub complete: bool,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            tour: Vec::new(),
            cost: f64::INFINITY,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: 0,
            clone_count: 0,
            pruned_count: 0,
            complete: false,
        }
    }

    /// Create a solution from a tour, recomputing its length from the instance
    pub fn from_tour(instance: &TSPInstance, tour: Vec<usize>, algorithm: &str) -> Self {
        let cost = instance.tour_length(&tour);
        Solution {
            tour,
            cost,
            algorithm: algorithm.to_string(),
            ..Self::new()
        }
    }

    /// Check if all points are visited exactly once
    pub fn is_complete(&self, instance: &TSPInstance) -> bool {
        if self.tour.len() != instance.dimension {
            return false;
        }

        let unique: HashSet<usize> = self.tour.iter().cloned().collect();
        unique.len() == instance.dimension && unique.iter().all(|&id| id < instance.dimension)
    }

    /// Get the position of a point in the tour
    pub fn position(&self, id: usize) -> Option<usize> {
        self.tour.iter().position(|&n| n == id)
    }

    /// Get the successor of a point in the tour
    pub fn successor(&self, id: usize) -> Option<usize> {
        self.position(id).map(|pos| self.tour[(pos + 1) % self.tour.len()])
    }

    /// Gap in percent to a reference length
    pub fn gap_to(&self, reference: f64) -> f64 {
        if reference > 0.0 {
            (self.cost - reference) / reference * 100.0
        } else {
            0.0
        }
    }

    /// Write the solution as pretty JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Length: {:.4}", self.cost)?;
        writeln!(f, "  Complete: {}", self.complete)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Clones: {} ({} pruned)", self.clone_count, self.pruned_count)?;
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> TSPInstance {
        TSPInstance::from_coords("square", &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)])
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new();
        assert!(sol.tour.is_empty());
        assert!(!sol.complete);
        assert_eq!(sol.cost, f64::INFINITY);
    }

    #[test]
    fn test_from_tour_and_completeness() {
        let instance = square();
        let sol = Solution::from_tour(&instance, vec![0, 1, 2, 3], "test");
        assert!((sol.cost - 8.0).abs() < 1e-12);
        assert!(sol.is_complete(&instance));
        assert_eq!(sol.successor(3), Some(0));

        let partial = Solution::from_tour(&instance, vec![0, 1, 2], "test");
        assert!(!partial.is_complete(&instance));

        let repeated = Solution::from_tour(&instance, vec![0, 1, 1, 3], "test");
        assert!(!repeated.is_complete(&instance));
    }

    #[test]
    fn test_gap() {
        let instance = square();
        let sol = Solution::from_tour(&instance, vec![0, 2, 1, 3], "crossed");
        assert!(sol.gap_to(8.0) > 0.0);
        assert_eq!(sol.gap_to(0.0), 0.0);
    }
}
