use branch_tsp_solver::heuristics::{
    Branch, BranchConfig, BranchSearchHeuristic, SearchConfig, SearchCoordinator, TourBranch,
};
use branch_tsp_solver::instance::{Point, TSPInstance};
use std::collections::HashMap;
use std::sync::Arc;

fn corner() -> Vec<Point> {
    TSPInstance::from_coords(
        "corner",
        &[(-15.0, -15.0), (-7.0, 6.0), (0.0, 0.0), (3.0, 0.0), (3.0, 13.0), (8.0, 5.0), (9.0, 6.0), (15.0, -15.0)],
    )
    .points
}

fn config(fork_on_first_placement: bool, relocation: bool, clone_ceiling: Option<usize>) -> SearchConfig {
    SearchConfig {
        clone_ceiling,
        max_iterations: None,
        branch: BranchConfig {
            fork_on_first_placement,
            relocation,
        },
    }
}

fn all_configs() -> Vec<SearchConfig> {
    let mut configs = Vec::new();
    for fork in [false, true] {
        for relocation in [false, true] {
            for ceiling in [Some(1), Some(4), Some(16)] {
                configs.push(config(fork, relocation, ceiling));
            }
        }
    }
    // without relocation or first-placement forks nothing ever forks
    configs.push(config(false, false, None));
    configs
}

fn brute_force_optimum(points: &[Point]) -> f64 {
    fn extend(points: &[Point], tour: &mut Vec<usize>, used: &mut [bool], partial: f64, best: &mut f64) {
        let last = tour[tour.len() - 1];
        if tour.len() == points.len() {
            *best = best.min(partial + points[last].distance_to(&points[0]));
            return;
        }
        for next in 1..points.len() {
            if used[next] {
                continue;
            }
            let step = partial + points[last].distance_to(&points[next]);
            if step >= *best {
                continue;
            }
            used[next] = true;
            tour.push(next);
            extend(points, tour, used, step, best);
            tour.pop();
            used[next] = false;
        }
    }

    let mut best = f64::INFINITY;
    let mut used = vec![false; points.len()];
    used[0] = true;
    extend(points, &mut vec![0], &mut used, 0.0, &mut best);
    best
}

fn is_permutation(tour: &[usize], n: usize) -> bool {
    let mut sorted = tour.to_vec();
    sorted.sort_unstable();
    sorted.len() == n && sorted.iter().enumerate().all(|(i, &id)| i == id)
}

#[test]
fn corner_trace_matches_reference_numbers() {
    let mut search = SearchCoordinator::from_points(&corner());
    assert!((search.current_length() - 95.7386).abs() < 1e-4);
    assert_eq!(search.unattached_points(), vec![2, 3, 5]);

    search.advance();
    assert!((search.current_length() - 96.5021).abs() < 1e-4);
    assert_eq!(search.clone_count(), 0);

    let mut forking = SearchCoordinator::with_config(&corner(), config(true, false, None));
    forking.advance();
    assert_eq!(forking.clone_count(), 1);
    assert_eq!(forking.live_branches(), 2);
    assert!((forking.current_length() - 95.7386).abs() < 1e-4);
}

#[test]
fn clone_ceiling_bounds_fork_count() {
    let mut unbounded = SearchCoordinator::with_config(&corner(), config(true, false, None));
    let length = unbounded.solve().expect("unbounded search terminates").length();
    assert!((length - 106.5968).abs() < 1e-4);
    assert_eq!(unbounded.clone_count(), 12);
    assert_eq!(unbounded.pruned_count(), 0);

    let mut bounded = SearchCoordinator::with_config(&corner(), config(true, false, Some(5)));
    let length = bounded.solve().expect("bounded search terminates").length();
    assert!((length - 106.5968).abs() < 1e-4);
    assert!(bounded.clone_count() <= 10);
    assert_eq!(bounded.clone_count(), 8);
}

#[test]
fn live_branches_never_exceed_ceiling() {
    let points = TSPInstance::random_uniform(30, 100.0, 7).points;
    for ceiling in [1, 2, 5, 12] {
        let mut search = SearchCoordinator::with_config(&points, config(true, true, Some(ceiling)));
        let mut steps = 0;
        while !search.is_solved() {
            search.advance();
            assert!(search.live_branches() <= ceiling, "ceiling {} exceeded", ceiling);
            steps += 1;
            assert!(steps < 100_000, "ceiling {} did not terminate", ceiling);
        }
    }
}

#[test]
fn random_instances_terminate_with_valid_tours() {
    for seed in 0..6 {
        let instance = TSPInstance::random_uniform(20 + 5 * seed as usize, 500.0, seed);
        for cfg in all_configs() {
            let mut search = SearchCoordinator::with_config(&instance.points, cfg);
            let terminal = search.solve().expect("search terminates").clone();

            assert!(is_permutation(terminal.tour(), instance.dimension), "{:?}", cfg);
            let recomputed = instance.tour_length(terminal.tour());
            assert!(
                (terminal.length() - recomputed).abs() < 1e-6 * recomputed,
                "length {} vs recomputed {} for {:?}",
                terminal.length(),
                recomputed,
                cfg
            );
            assert_eq!(search.live_branches(), 1);
            assert!(search.unattached_points().is_empty());
        }
    }
}

#[test]
fn every_step_partitions_points_and_keeps_length_consistent() {
    let points: Arc<[Point]> = TSPInstance::random_uniform(40, 100.0, 3).points.into();
    let n = points.len();
    for relocation in [false, true] {
        let cfg = BranchConfig {
            fork_on_first_placement: false,
            relocation,
        };
        let mut branch = TourBranch::new(points.clone(), cfg);
        let mut attached = branch.attached_count();

        while branch.peek_next().is_some() {
            assert!(branch.advance().is_none() || relocation);
            assert_eq!(branch.attached_count() + branch.unattached_count(), n);
            assert!(branch.attached_count() >= attached);
            attached = branch.attached_count();

            let mut seen = branch.attached_points();
            seen.extend(branch.unattached_points());
            assert!(is_permutation(&seen, n));

            let recomputed = branch.tour().length(&points);
            assert!((branch.length() - recomputed).abs() < 1e-9 * recomputed);
        }
        assert_eq!(branch.unattached_count(), 0);
    }
}

#[test]
fn forked_branch_is_independent_of_original() {
    let points: Arc<[Point]> = corner().into();
    let cfg = BranchConfig {
        fork_on_first_placement: true,
        relocation: true,
    };
    let mut original = TourBranch::new(points, cfg);
    let mut fork = original.advance().expect("first placement forks");

    let length = original.length();
    let candidates = original.candidate_count();
    let order = original.tour().order();
    let unattached = original.unattached_points();

    while fork.peek_next().is_some() {
        fork.advance();
    }
    assert_eq!(fork.unattached_count(), 0);

    assert_eq!(original.length(), length);
    assert_eq!(original.candidate_count(), candidates);
    assert_eq!(original.tour().order(), order);
    assert_eq!(original.unattached_points(), unattached);
}

#[test]
fn forking_branch_consumes_one_candidate_per_fork() {
    let points: Arc<[Point]> = corner().into();
    let cfg = BranchConfig {
        fork_on_first_placement: true,
        relocation: false,
    };
    let mut branch = TourBranch::new(points, cfg);
    let mut forks = 0;
    while branch.unattached_count() > 1 {
        let before = branch.candidate_count();
        match branch.advance() {
            Some(_) => {
                forks += 1;
                assert_eq!(branch.candidate_count(), before - 1);
            }
            None => break,
        }
    }
    assert!(forks > 0);
}

#[test]
fn collapse_discards_remaining_live_branches() {
    // The search stops at the first complete branch that cannot improve, so live
    // branches that might still reach a shorter tour are thrown away.
    let mut search = SearchCoordinator::with_config(&corner(), config(true, false, None));
    let mut live_before_collapse = 0;
    while !search.is_solved() {
        live_before_collapse = search.live_branches();
        search.advance();
    }
    assert_eq!(live_before_collapse, 13);
    assert_eq!(search.live_branches(), 1);

    let optimum = brute_force_optimum(&corner());
    let length = search.terminal().map(|t| t.length()).unwrap_or(f64::NAN);
    assert!(length >= optimum - 1e-9);
}

#[test]
fn relocating_search_can_stop_above_the_optimum() {
    // Known heuristic cutoff: insertion with relocation but no first-placement forks
    // settles on a longer tour that the forking variants avoid.
    let points = TSPInstance::from_coords(
        "cutoff",
        &[(10.0, 7.0), (7.0, 5.0), (5.0, 17.0), (15.0, 2.0), (14.0, 17.0), (15.0, 15.0), (10.0, 6.0), (11.0, 10.0)],
    )
    .points;
    let optimum = brute_force_optimum(&points);
    assert!((optimum - 48.9141).abs() < 1e-4);

    let length_of = |cfg: SearchConfig| {
        let mut search = SearchCoordinator::with_config(&points, cfg);
        search.solve().map(|t| t.length()).unwrap_or(f64::NAN)
    };

    let relocating = length_of(BranchSearchHeuristic::relocating().config);
    assert!((relocating - 49.3242).abs() < 1e-4);
    assert!(relocating > optimum + 0.1);

    let greedy = length_of(SearchConfig::default());
    assert!((greedy - 49.7577).abs() < 1e-4);

    for relocation in [false, true] {
        let forking = length_of(config(true, relocation, None));
        assert!((forking - optimum).abs() < 1e-6);
    }
}

#[test]
fn attached_point_entry_counts_never_grow() {
    let points: Arc<[Point]> = TSPInstance::random_uniform(30, 100.0, 13).points.into();
    for fork_on_first_placement in [false, true] {
        let cfg = BranchConfig {
            fork_on_first_placement,
            relocation: false,
        };
        let mut branch = TourBranch::new(points.clone(), cfg);
        let mut counts: HashMap<usize, usize> = HashMap::new();

        while branch.peek_next().is_some() {
            let fork = branch.advance();

            for id in branch.attached_points() {
                let now = branch.candidates_for(id).len();
                if let Some(&before) = counts.get(&id) {
                    assert!(now <= before, "point {} grew from {} to {} entries", id, before, now);
                }
                counts.insert(id, now);
            }
            if let Some(fork) = fork {
                for id in fork.attached_points() {
                    assert!(fork.candidates_for(id).is_empty(), "fork kept entries for point {}", id);
                }
            }
        }
        assert_eq!(counts.len(), points.len());
        assert!(counts.values().all(|&c| c == 0));
    }
}

#[test]
fn attached_points_never_regain_candidates() {
    let points: Arc<[Point]> = TSPInstance::random_uniform(35, 100.0, 21).points.into();
    for relocation in [false, true] {
        let cfg = BranchConfig {
            fork_on_first_placement: false,
            relocation,
        };
        let mut branch = TourBranch::new(points.clone(), cfg);
        let mut exhausted: Vec<usize> = Vec::new();

        while branch.peek_next().is_some() {
            branch.advance();
            for &id in &exhausted {
                assert!(branch.candidates_for(id).is_empty(), "point {} regained a candidate", id);
            }
            exhausted = branch
                .attached_points()
                .into_iter()
                .filter(|&id| branch.candidates_for(id).is_empty())
                .collect();
            if !relocation {
                assert_eq!(exhausted.len(), branch.attached_count());
            }
        }
        assert_eq!(exhausted.len(), points.len());
    }
}
