//! Convex perimeter construction.
//!
//! The starting tour of every search is the convex hull of the instance (Andrew's
//! monotone chain). Only strict turns are kept, so points lying on a hull edge and
//! duplicates stay interior and get attached by the search with zero insertion cost.

use crate::instance::Point;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Initial attached / unattached split of an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perimeter {
    /// Hull vertices, counter-clockwise from the lowest (x, y) point
    pub order: Vec<usize>,
    /// Every other point id, ascending
    pub unattached: Vec<usize>,
    /// Hull membership indexed by point id
    pinned: Vec<bool>,
}

impl Perimeter {
    /// True for hull vertices; ids outside the instance are never pinned
    pub fn is_pinned(&self, id: usize) -> bool {
        self.pinned.get(id).copied().unwrap_or(false)
    }
}

/// z-component of `(a - o) x (b - o)`; positive for a counter-clockwise turn
fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Build the convex perimeter tour and the set of interior points.
pub fn build_perimeter(points: &[Point]) -> Perimeter {
    let mut sorted: Vec<usize> = (0..points.len()).collect();
    sorted.sort_by_key(|&i| (OrderedFloat(points[i].x), OrderedFloat(points[i].y), i));

    let order = if sorted.len() < 3 {
        dedup_coincident(points, sorted)
    } else {
        let mut lower: Vec<usize> = Vec::new();
        for &i in &sorted {
            while lower.len() >= 2
                && cross(&points[lower[lower.len() - 2]], &points[lower[lower.len() - 1]], &points[i]) <= 0.0
            {
                lower.pop();
            }
            lower.push(i);
        }

        let mut upper: Vec<usize> = Vec::new();
        for &i in sorted.iter().rev() {
            while upper.len() >= 2
                && cross(&points[upper[upper.len() - 2]], &points[upper[upper.len() - 1]], &points[i]) <= 0.0
            {
                upper.pop();
            }
            upper.push(i);
        }

        lower.pop();
        upper.pop();
        lower.extend(upper);
        dedup_coincident(points, lower)
    };

    let mut on_hull = vec![false; points.len()];
    for &i in &order {
        on_hull[i] = true;
    }
    let unattached = (0..points.len()).filter(|&i| !on_hull[i]).collect();

    Perimeter {
        order,
        unattached,
        pinned: on_hull,
    }
}

/// All-identical inputs collapse to a single hull vertex
fn dedup_coincident(points: &[Point], mut order: Vec<usize>) -> Vec<usize> {
    if order.len() == 2 {
        let (a, b) = (&points[order[0]], &points[order[1]]);
        if a.x == b.x && a.y == b.y {
            order.pop();
        }
    }
    order
}
