use crate::heuristics::branch::BranchConfig;
use crate::heuristics::search::{SearchConfig, SearchCoordinator, DEFAULT_CLONE_CEILING};
use crate::instance::TSPInstance;
use crate::solution::Solution;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &TSPInstance) -> Solution;
    fn name(&self) -> &str;
}

/// One configured branch search
///
/// Builds the convex perimeter, then lets a [`SearchCoordinator`] insert and relocate
/// interior points until the best branch is locally optimal.
pub struct BranchSearchHeuristic {
    pub config: SearchConfig,
    name: String,
}

impl BranchSearchHeuristic {
    pub fn new(config: SearchConfig) -> Self {
        let name = Self::name_for(&config);
        BranchSearchHeuristic { config, name }
    }

    /// Plain cheapest insertion: no relocation, so nothing ever forks
    pub fn greedy() -> Self {
        Self::new(SearchConfig::default())
    }

    /// Cheapest insertion with relocation of already attached points.
    ///
    /// Relocations fork whenever a point still has competing options, so the forest is
    /// capped at [`DEFAULT_CLONE_CEILING`] live branches.
    pub fn relocating() -> Self {
        Self::new(SearchConfig {
            clone_ceiling: Some(DEFAULT_CLONE_CEILING),
            branch: BranchConfig {
                fork_on_first_placement: false,
                relocation: true,
            },
            ..SearchConfig::default()
        })
    }

    /// Forks on every placement, bounded by `ceiling` live branches. `None` is only
    /// practical on small instances.
    pub fn forking(ceiling: Option<usize>) -> Self {
        Self::new(SearchConfig {
            clone_ceiling: ceiling,
            branch: BranchConfig {
                fork_on_first_placement: true,
                relocation: true,
            },
            ..SearchConfig::default()
        })
    }

    pub fn with_max_iterations(mut self, limit: usize) -> Self {
        self.config.max_iterations = Some(limit);
        self
    }

    fn name_for(config: &SearchConfig) -> String {
        let mut name = String::from(match (config.branch.fork_on_first_placement, config.branch.relocation) {
            (false, false) => "BranchSearch-Greedy",
            (false, true) => "BranchSearch-Relocating",
            (true, false) => "BranchSearch-ForkInsert",
            (true, true) => "BranchSearch-Forking",
        });
        if let Some(ceiling) = config.clone_ceiling {
            name.push_str(&format!("-C{}", ceiling));
        }
        name
    }
}

impl Default for BranchSearchHeuristic {
    fn default() -> Self {
        Self::relocating()
    }
}

impl ConstructionHeuristic for BranchSearchHeuristic {
    fn construct(&self, instance: &TSPInstance) -> Solution {
        let start = std::time::Instant::now();
        let mut search = SearchCoordinator::with_config(&instance.points, self.config);

        let (tour, complete) = match search.solve() {
            Some(terminal) => (terminal.tour().to_vec(), true),
            None => (search.attached_points(), false),
        };
        let reported = search.current_length();

        let mut solution = Solution::from_tour(instance, tour, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = search.iteration_count();
        solution.clone_count = search.clone_count();
        solution.pruned_count = search.pruned_count();
        solution.complete = complete;

        if (solution.cost - reported).abs() > 1e-6 * reported.max(1.0) {
            log::warn!(
                "{}: tracked length {:.6} differs from recomputed {:.6}",
                self.name(),
                reported,
                solution.cost
            );
        }
        log::debug!(
            "{} on {}: length {:.4} in {} iterations ({} clones)",
            self.name(),
            instance.name,
            solution.cost,
            solution.iterations,
            solution.clone_count
        );
        solution
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Runs several search variants and keeps the shortest complete tour
pub struct MultiVariantSearch {
    heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>>,
}

impl MultiVariantSearch {
    pub fn new() -> Self {
        MultiVariantSearch {
            heuristics: Vec::new(),
        }
    }

    pub fn with_standard_variants() -> Self {
        let heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>> = vec![
            Box::new(BranchSearchHeuristic::greedy()),
            Box::new(BranchSearchHeuristic::relocating()),
            Box::new(BranchSearchHeuristic::forking(Some(4))),
            Box::new(BranchSearchHeuristic::forking(Some(16))),
        ];

        MultiVariantSearch { heuristics }
    }

    pub fn add_heuristic<H: ConstructionHeuristic + Send + Sync + 'static>(&mut self, h: H) {
        self.heuristics.push(Box::new(h));
    }

    pub fn len(&self) -> usize {
        self.heuristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristics.is_empty()
    }
}

impl Default for MultiVariantSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for MultiVariantSearch {
    fn construct(&self, instance: &TSPInstance) -> Solution {
        let start = std::time::Instant::now();

        let mut best_solution = Solution::new();
        let mut iterations = 0;
        for heuristic in &self.heuristics {
            let solution = heuristic.construct(instance);
            iterations += solution.iterations;

            let better = match (solution.complete, best_solution.complete) {
                (true, false) => true,
                (false, true) => false,
                _ => solution.cost < best_solution.cost,
            };
            if better || best_solution.tour.is_empty() {
                best_solution = solution;
            }
        }

        best_solution.algorithm = format!("MultiVariant({})", best_solution.algorithm);
        best_solution.iterations = iterations;
        best_solution.computation_time = start.elapsed().as_secs_f64();
        best_solution
    }

    fn name(&self) -> &str {
        "MultiVariant"
    }
}
