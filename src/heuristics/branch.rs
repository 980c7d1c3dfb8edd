//! Tour branches: one candidate tour under construction.
//!
//! A [`TourBranch`] starts from the convex perimeter and grows by popping its cheapest
//! [`InsertionCandidate`]. Candidates for unattached points carry their raw insertion
//! cost; candidates for attached points carry the *net* length change of moving the
//! point (`insertion_cost - removal_value`), so `length` is always maintained by adding
//! the popped cost and never recomputed from the edges.
//!
//! When the popped candidate is not the only option left for its point, the branch
//! forks: the clone takes the candidate and the original keeps the other options.

use crate::geometry::{Segment, Tour};
use crate::heuristics::perimeter::{build_perimeter, Perimeter};
use crate::heuristics::terminal::TerminalBranch;
use crate::instance::Point;
use crate::queue::CandidateQueue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Splice `point` into `segment` for `cost`
#[derive(Debug, Clone, Copy)]
pub struct InsertionCandidate {
    pub point: usize,
    pub segment: Segment,
    pub cost: f64,
}

impl InsertionCandidate {
    /// Queue ordering key
    pub fn priority(candidate: &Self) -> f64 {
        candidate.cost
    }
}

/// Per-point bookkeeping of a branch
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointStatus {
    pub is_unattached: bool,
    /// Part of the initial perimeter; never relocated, removal value stays 0
    pub is_pinned: bool,
    /// Length recovered by detaching the point from its current position
    pub removal_value: f64,
}

/// Selects the branch variant at construction
///
/// The default drops every candidate of a point once it is attached, so attached points
/// never gain entries. With `relocation` an attached point keeps its other candidates
/// as relocation moves; those entries multiply as their segments are split, until the
/// point moves once and loses them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    /// Fork on the first placement of a point too, not only on relocations
    pub fork_on_first_placement: bool,
    /// Keep a point's other candidates after it is attached, as relocation moves
    pub relocation: bool,
}

impl Default for BranchConfig {
    fn default() -> Self {
        BranchConfig {
            fork_on_first_placement: false,
            relocation: false,
        }
    }
}

/// Capabilities the search coordinator needs from a branch
pub trait Branch: Clone {
    /// Mutate in place, or leave `self` untouched and return a fork that took the step
    fn advance(&mut self) -> Option<Self>;

    /// Current closed tour length
    fn length(&self) -> f64;

    /// Length after applying the next candidate; equals `length()` once the branch is
    /// complete and no candidate would shorten it
    fn length_with_next(&self) -> f64;

    fn peek_next(&self) -> Option<&InsertionCandidate>;

    /// Attached point ids in tour order
    fn attached_points(&self) -> Vec<usize>;

    /// Unattached point ids, ascending
    fn unattached_points(&self) -> Vec<usize>;

    fn attached_count(&self) -> usize;

    fn unattached_count(&self) -> usize;

    /// Freeze into the cheapest resident form
    fn into_terminal(self) -> TerminalBranch;
}

/// Net cost of putting `point` on `segment` given its current removal value
#[inline]
fn net_cost(status: &[PointStatus], point: &Point, segment: &Segment) -> f64 {
    segment.insertion_cost(point) - status[point.id].removal_value
}

/// Queue entry for `point` on `segment`, or nothing when `point` bounds `segment`
#[inline]
fn candidate(status: &[PointStatus], points: &[Point], point: usize, segment: Segment) -> Option<InsertionCandidate> {
    if segment.touches(point) {
        return None;
    }
    Some(InsertionCandidate {
        point,
        segment,
        cost: net_cost(status, &points[point], &segment),
    })
}

#[derive(Debug, Clone)]
pub struct TourBranch {
    points: Arc<[Point]>,
    tour: Tour,
    status: Vec<PointStatus>,
    unattached: usize,
    candidates: CandidateQueue<InsertionCandidate>,
    length: f64,
    config: BranchConfig,
}

impl TourBranch {
    /// Root branch over `points`, starting from their convex perimeter
    pub fn new(points: Arc<[Point]>, config: BranchConfig) -> Self {
        let perimeter = build_perimeter(&points);
        Self::from_perimeter(points, &perimeter, config)
    }

    /// Root branch from an externally built perimeter
    pub fn from_perimeter(points: Arc<[Point]>, perimeter: &Perimeter, config: BranchConfig) -> Self {
        let n = points.len();
        let tour = Tour::from_order(n, &perimeter.order);

        let mut status = vec![PointStatus::default(); n];
        for &id in &perimeter.order {
            status[id].is_pinned = true;
        }
        for &id in &perimeter.unattached {
            status[id].is_unattached = true;
        }

        let edges = tour.segments(&points);
        let length: f64 = edges.iter().map(|s| s.length).sum();

        let mut candidates = CandidateQueue::with_capacity(InsertionCandidate::priority, perimeter.unattached.len() * edges.len());
        candidates.push_all(perimeter.unattached.iter().flat_map(|&id| {
            let point = points[id];
            edges.iter().map(move |&segment| InsertionCandidate {
                point: id,
                segment,
                cost: segment.insertion_cost(&point),
            })
        }));

        log::trace!(
            "root branch: {} perimeter points, {} unattached, {} candidates",
            perimeter.order.len(),
            perimeter.unattached.len(),
            candidates.len()
        );

        TourBranch {
            points,
            tour,
            status,
            unattached: perimeter.unattached.len(),
            candidates,
            length,
            config,
        }
    }

    pub fn points(&self) -> &Arc<[Point]> {
        &self.points
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn status(&self, id: usize) -> &PointStatus {
        &self.status[id]
    }

    pub fn config(&self) -> BranchConfig {
        self.config
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Pending candidates for `id`, in no particular order
    pub fn candidates_for(&self, id: usize) -> Vec<InsertionCandidate> {
        self.candidates.iter().filter(|c| c.point == id).copied().collect()
    }

    fn place(&mut self, candidate: InsertionCandidate) {
        if self.status[candidate.point].is_unattached {
            self.attach(candidate);
        } else {
            self.relocate(candidate);
        }
    }

    fn refresh_removal_value(&mut self, id: usize) {
        let status = self.status[id];
        if status.is_pinned || status.is_unattached {
            return;
        }
        let (Some(prev), Some(next)) = (self.tour.predecessor(id), self.tour.successor(id)) else {
            return;
        };

        let (p, a, b) = (&self.points[id], &self.points[prev], &self.points[next]);
        self.status[id].removal_value = a.distance_to(p) + p.distance_to(b) - a.distance_to(b);
    }

    /// First placement of an unattached point
    fn attach(&mut self, chosen: InsertionCandidate) {
        let moved = chosen.point;
        let target = chosen.segment;
        let (left, right) = self.tour.split(&target, &self.points[moved]);

        self.length += chosen.cost;
        self.status[moved].is_unattached = false;
        self.unattached -= 1;

        let touched = [moved, target.start.id, target.end.id];
        for &id in &touched {
            self.refresh_removal_value(id);
        }

        let keep_own = self.config.relocation;
        let points = &self.points;
        let status = &self.status;
        self.candidates.replace_all(|c, out| {
            if c.point == moved {
                if keep_own && c.segment != target {
                    out.extend(candidate(status, points, c.point, c.segment));
                }
                return;
            }
            if c.segment == target {
                out.extend(candidate(status, points, c.point, left));
                out.extend(candidate(status, points, c.point, right));
                return;
            }
            if touched.contains(&c.point) {
                out.extend(candidate(status, points, c.point, c.segment));
                return;
            }
            out.push(c);
        });
    }

    /// Move an attached point to another edge; `chosen.cost` is already the net delta
    fn relocate(&mut self, chosen: InsertionCandidate) {
        let moved = chosen.point;
        let target = chosen.segment;
        let merge = self.tour.merge(&self.points, moved);
        let (left, right) = self.tour.split(&target, &self.points[moved]);

        self.length += chosen.cost;

        let touched = [moved, merge.merged.start.id, merge.merged.end.id, target.start.id, target.end.id];
        for &id in &touched {
            self.refresh_removal_value(id);
        }

        let points = &self.points;
        let status = &self.status;
        let mut merged_seen: HashSet<usize> = HashSet::new();
        self.candidates.replace_all(|c, out| {
            if c.point == moved {
                return;
            }
            if c.segment == merge.removed_a || c.segment == merge.removed_b {
                if merged_seen.insert(c.point) {
                    out.extend(candidate(status, points, c.point, merge.merged));
                }
                return;
            }
            if c.segment == target {
                out.extend(candidate(status, points, c.point, left));
                out.extend(candidate(status, points, c.point, right));
                return;
            }
            if touched.contains(&c.point) {
                out.extend(candidate(status, points, c.point, c.segment));
                return;
            }
            out.push(c);
        });
    }
}

impl Branch for TourBranch {
    fn advance(&mut self) -> Option<Self> {
        let chosen = self.candidates.pop()?;
        let point = chosen.point;
        let first_placement = self.status[point].is_unattached;

        if self.candidates.is_empty()
            || (first_placement && (!self.config.fork_on_first_placement || self.unattached == 1))
        {
            self.place(chosen);
            return None;
        }

        if !self.candidates.any_match(|c| c.point == point) {
            self.place(chosen);
            return None;
        }

        let mut fork = self.clone();
        fork.place(chosen);
        Some(fork)
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn length_with_next(&self) -> f64 {
        match self.candidates.peek() {
            None => self.length,
            Some(next) if self.unattached == 0 && next.cost >= 0.0 => self.length,
            Some(next) => self.length + next.cost,
        }
    }

    fn peek_next(&self) -> Option<&InsertionCandidate> {
        self.candidates.peek()
    }

    fn attached_points(&self) -> Vec<usize> {
        self.tour.order()
    }

    fn unattached_points(&self) -> Vec<usize> {
        self.status
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_unattached)
            .map(|(id, _)| id)
            .collect()
    }

    fn attached_count(&self) -> usize {
        self.tour.len()
    }

    fn unattached_count(&self) -> usize {
        self.unattached
    }

    fn into_terminal(self) -> TerminalBranch {
        TerminalBranch::new(self.tour.order(), self.length)
    }
}
