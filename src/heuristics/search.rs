//! Best-first search over a forest of tour branches.
//!
//! The [`SearchCoordinator`] keeps every live branch in one [`CandidateQueue`] keyed by
//! `length_with_next`. Each [`advance`](SearchCoordinator::advance) steps the cheapest
//! branch once, queues the fork it may produce, and collapses the whole forest to a
//! [`TerminalBranch`] as soon as the best branch is complete and no pending move would
//! shorten it. The collapse discards every other branch unexplored, so the result is a
//! heuristic answer, not a proven optimum.

use crate::heuristics::branch::{Branch, BranchConfig, InsertionCandidate, TourBranch};
use crate::heuristics::terminal::TerminalBranch;
use crate::instance::Point;
use crate::queue::CandidateQueue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A queued search state
#[derive(Debug, Clone)]
pub enum Ranked<B> {
    Building(B),
    Done(TerminalBranch),
}

impl<B: Branch> Ranked<B> {
    /// Queue ordering key
    pub fn priority(ranked: &Self) -> f64 {
        ranked.length_with_next()
    }

    pub fn length(&self) -> f64 {
        match self {
            Ranked::Building(b) => b.length(),
            Ranked::Done(t) => t.length(),
        }
    }

    pub fn length_with_next(&self) -> f64 {
        match self {
            Ranked::Building(b) => b.length_with_next(),
            Ranked::Done(t) => t.length(),
        }
    }

    pub fn attached_count(&self) -> usize {
        match self {
            Ranked::Building(b) => b.attached_count(),
            Ranked::Done(t) => t.len(),
        }
    }

    pub fn unattached_count(&self) -> usize {
        match self {
            Ranked::Building(b) => b.unattached_count(),
            Ranked::Done(_) => 0,
        }
    }

    /// Completion-normalized score used to pick the prune victim
    pub fn badness(&self) -> f64 {
        self.length_with_next() / self.attached_count().max(1) as f64
    }
}

/// Live branch bound of the relocating and forking presets
pub const DEFAULT_CLONE_CEILING: usize = 16;

/// Search limits and branch variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of live branches; `None` never prunes
    pub clone_ceiling: Option<usize>,
    /// Stop [`SearchCoordinator::solve`] after this many advances
    pub max_iterations: Option<usize>,
    pub branch: BranchConfig,
}

impl SearchConfig {
    /// Ceiling clamped to at least one live branch
    pub fn effective_ceiling(&self) -> Option<usize> {
        self.clone_ceiling.map(|c| c.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct SearchCoordinator<B = TourBranch> {
    branches: CandidateQueue<Ranked<B>>,
    config: SearchConfig,
    clone_count: usize,
    iteration_count: usize,
    pruned_count: usize,
}

impl SearchCoordinator<TourBranch> {
    /// Search over `points` with default settings
    pub fn from_points(points: &[Point]) -> Self {
        Self::with_config(points, SearchConfig::default())
    }

    pub fn with_config(points: &[Point], config: SearchConfig) -> Self {
        let points: Arc<[Point]> = points.into();
        let root = TourBranch::new(points, config.branch);
        let mut coordinator = SearchCoordinator::new(root);
        coordinator.config = config;
        coordinator.config.clone_ceiling = config.effective_ceiling();
        coordinator
    }
}

impl<B: Branch> SearchCoordinator<B> {
    /// Search starting from a single root branch
    pub fn new(root: B) -> Self {
        let mut branches = CandidateQueue::new(Ranked::<B>::priority);
        branches.push(Ranked::Building(root));
        SearchCoordinator {
            branches,
            config: SearchConfig::default(),
            clone_count: 0,
            iteration_count: 0,
            pruned_count: 0,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Bound the number of live branches. Zero is treated as one.
    pub fn set_clone_ceiling(&mut self, ceiling: usize) {
        if ceiling == 0 {
            log::warn!("clone ceiling of 0 clamped to 1");
        }
        self.config.clone_ceiling = Some(ceiling.max(1));
    }

    pub fn set_max_iterations(&mut self, limit: Option<usize>) {
        self.config.max_iterations = limit;
    }

    /// Step the cheapest branch once.
    pub fn advance(&mut self) {
        if !matches!(self.branches.peek(), Some(Ranked::Building(_))) {
            return;
        }
        let Some(Ranked::Building(mut branch)) = self.branches.pop() else {
            return;
        };
        self.iteration_count += 1;

        let fork = branch.advance();
        log::trace!(
            "iteration {}: length {:.4}, {} attached, {} unattached",
            self.iteration_count,
            branch.length(),
            branch.attached_count(),
            branch.unattached_count()
        );
        self.branches.push(Ranked::Building(branch));

        if let Some(fork) = fork {
            self.clone_count += 1;
            log::debug!(
                "iteration {}: fork #{} at length {:.4} ({} live branches)",
                self.iteration_count,
                self.clone_count,
                fork.length(),
                self.branches.len() + 1
            );
            self.branches.push(Ranked::Building(fork));
        }

        let finished = matches!(
            self.branches.peek(),
            Some(Ranked::Building(best)) if best.unattached_count() == 0 && best.length_with_next() >= best.length()
        );
        if finished {
            if let Some(Ranked::Building(best)) = self.branches.pop() {
                self.collapse(best);
            }
            return;
        }

        if let Some(ceiling) = self.config.clone_ceiling {
            if self.branches.len() > ceiling {
                self.prune();
            }
        }
    }

    fn collapse(&mut self, best: B) {
        let discarded = self.branches.len();
        let terminal = best.into_terminal();
        log::info!(
            "search solved after {} iterations: length {:.4}, {} clones, {} pruned, {} branches discarded",
            self.iteration_count,
            terminal.length(),
            self.clone_count,
            self.pruned_count,
            discarded
        );
        self.branches.clear();
        self.branches.push(Ranked::Done(terminal));
    }

    /// Drop the live branch with the highest badness, the first one in storage order on ties.
    pub fn prune(&mut self) {
        let mut worst: Option<(usize, f64)> = None;
        for (index, ranked) in self.branches.iter().enumerate() {
            let badness = ranked.badness();
            if worst.map_or(true, |(_, w)| badness > w) {
                worst = Some((index, badness));
            }
        }
        let Some((victim, badness)) = worst else {
            return;
        };

        let mut index = 0;
        self.branches.replace_all(|ranked, out| {
            if index != victim {
                out.push(ranked);
            }
            index += 1;
        });
        self.pruned_count += 1;
        log::debug!(
            "pruned branch with badness {:.4}, {} live branches",
            badness,
            self.branches.len()
        );
    }

    pub fn is_solved(&self) -> bool {
        matches!(self.branches.peek(), Some(Ranked::Done(_)))
    }

    pub fn terminal(&self) -> Option<&TerminalBranch> {
        match self.branches.peek() {
            Some(Ranked::Done(t)) => Some(t),
            _ => None,
        }
    }

    pub fn best(&self) -> Option<&Ranked<B>> {
        self.branches.peek()
    }

    /// Next move of the best branch; `None` once solved
    pub fn peek_next_candidate(&self) -> Option<&InsertionCandidate> {
        match self.branches.peek() {
            Some(Ranked::Building(b)) => b.peek_next(),
            _ => None,
        }
    }

    pub fn current_length(&self) -> f64 {
        self.branches.peek().map_or(0.0, |r| r.length())
    }

    /// Attached points of the best branch, in tour order
    pub fn attached_points(&self) -> Vec<usize> {
        match self.branches.peek() {
            Some(Ranked::Building(b)) => b.attached_points(),
            Some(Ranked::Done(t)) => t.tour().to_vec(),
            None => Vec::new(),
        }
    }

    pub fn unattached_points(&self) -> Vec<usize> {
        match self.branches.peek() {
            Some(Ranked::Building(b)) => b.unattached_points(),
            _ => Vec::new(),
        }
    }

    pub fn clone_count(&self) -> usize {
        self.clone_count
    }

    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    pub fn pruned_count(&self) -> usize {
        self.pruned_count
    }

    pub fn live_branches(&self) -> usize {
        self.branches.len()
    }

    /// Advance at most `limit` times; true when solved
    pub fn run(&mut self, limit: usize) -> bool {
        for _ in 0..limit {
            if self.is_solved() {
                break;
            }
            self.advance();
        }
        self.is_solved()
    }

    /// Advance until solved or `max_iterations` is reached.
    pub fn solve(&mut self) -> Option<&TerminalBranch> {
        while !self.is_solved() {
            if let Some(limit) = self.config.max_iterations {
                if self.iteration_count >= limit {
                    log::warn!(
                        "search stopped at the iteration limit ({}) with {} live branches",
                        limit,
                        self.branches.len()
                    );
                    break;
                }
            }
            self.advance();
        }
        self.terminal()
    }
}
