//! Finished stand-in for a solved search.

use serde::{Deserialize, Serialize};

/// A completed tour and its length. Holds nothing else, and cannot advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalBranch {
    tour: Vec<usize>,
    length: f64,
}

impl TerminalBranch {
    pub fn new(tour: Vec<usize>, length: f64) -> Self {
        TerminalBranch { tour, length }
    }

    /// Point ids in visiting order
    pub fn tour(&self) -> &[usize] {
        &self.tour
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn len(&self) -> usize {
        self.tour.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tour.is_empty()
    }

    pub fn into_tour(self) -> Vec<usize> {
        self.tour
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_serializes() {
        let terminal = TerminalBranch::new(vec![0, 2, 1], 12.5);
        let json = serde_json::to_string(&terminal).unwrap();
        let back: TerminalBranch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, terminal);
        assert_eq!(back.len(), 3);
        assert_eq!(back.into_tour(), vec![0, 2, 1]);
    }
}
