//! Benchmarking and experimentation module.
//!
//! Runs every configured search variant on a set of instances, collects one
//! [`AlgorithmResult`] per (instance, variant) pair, and summarizes them per variant.

use crate::error::{Error, Result};
use crate::heuristics::construction::{BranchSearchHeuristic, ConstructionHeuristic};
use crate::heuristics::search::SearchConfig;
use crate::instance::TSPInstance;
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single variant on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Instance dimension
    pub dimension: usize,
    /// Tour length
    pub cost: f64,
    /// Whether the search finished before its iteration limit
    pub complete: bool,
    /// Computation time in seconds
    pub time: f64,
    pub iterations: usize,
    pub clone_count: usize,
    pub pruned_count: usize,
    /// Gap in percent to the best known length, or to the best length of this run
    pub gap_to_best: Option<f64>,
}

impl AlgorithmResult {
    fn from_solution(instance: &TSPInstance, solution: &Solution) -> Self {
        AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            dimension: instance.dimension,
            cost: solution.cost,
            complete: solution.complete,
            time: solution.computation_time,
            iterations: solution.iterations,
            clone_count: solution.clone_count,
            pruned_count: solution.pruned_count,
            gap_to_best: None,
        }
    }
}

/// Aggregated statistics for a variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub num_instances: usize,
    pub num_complete: usize,
    pub avg_cost: f64,
    pub best_cost: f64,
    pub worst_cost: f64,
    /// Sample standard deviation, 0 with fewer than two runs
    pub std_cost: f64,
    pub avg_time: f64,
    pub total_time: f64,
    pub avg_clones: f64,
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Search variants to compare
    pub variants: Vec<SearchConfig>,
    /// Run instances in parallel
    pub parallel: bool,
    /// Worker threads, all cores when unset
    pub threads: Option<usize>,
    pub show_progress: bool,
    /// Output directory
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            variants: vec![
                BranchSearchHeuristic::greedy().config,
                BranchSearchHeuristic::relocating().config,
                BranchSearchHeuristic::forking(Some(4)).config,
                BranchSearchHeuristic::forking(Some(16)).config,
            ],
            parallel: true,
            threads: None,
            show_progress: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    best_known: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            best_known: HashMap::new(),
        }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Set best known length for an instance
    pub fn set_best_known(&mut self, instance_name: &str, cost: f64) {
        self.best_known.insert(instance_name.to_string(), cost);
    }

    fn heuristics(&self) -> Vec<BranchSearchHeuristic> {
        self.config.variants.iter().copied().map(BranchSearchHeuristic::new).collect()
    }

    /// Run every variant on one instance
    pub fn run_instance(&self, instance: &TSPInstance) -> Vec<AlgorithmResult> {
        log::info!("Running benchmark on instance: {} ({} points)", instance.name, instance.dimension);
        self.heuristics()
            .iter()
            .map(|heuristic| {
                let solution = heuristic.construct(instance);
                AlgorithmResult::from_solution(instance, &solution)
            })
            .collect()
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[TSPInstance]) -> Result<()> {
        let progress = if self.config.show_progress {
            let bar = ProgressBar::new(instances.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let run = |instance: &TSPInstance| {
            let rows = self.run_instance(instance);
            progress.set_message(instance.name.clone());
            progress.inc(1);
            rows
        };

        let batches: Vec<Vec<AlgorithmResult>> = if self.config.parallel {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(threads) = self.config.threads {
                builder = builder.num_threads(threads);
            }
            let pool = builder
                .build()
                .map_err(|e| Error::config(format!("rayon pool: {e}")))?;
            pool.install(|| instances.par_iter().map(run).collect())
        } else {
            instances.iter().map(run).collect()
        };
        progress.finish_with_message("done");

        for mut rows in batches {
            self.fill_gaps(&mut rows);
            self.results.extend(rows);
        }
        Ok(())
    }

    /// Gaps against the best known length, falling back to the best row of the batch
    fn fill_gaps(&self, rows: &mut [AlgorithmResult]) {
        let Some(first) = rows.first() else {
            return;
        };
        let reference = self.best_known.get(&first.instance).copied().or_else(|| {
            let best = rows
                .iter()
                .filter(|r| r.complete)
                .map(|r| r.cost)
                .fold(f64::INFINITY, f64::min);
            best.is_finite().then_some(best)
        });
        if let Some(best) = reference {
            for row in rows.iter_mut() {
                row.gap_to_best = Some(if best > 0.0 { (row.cost - best) / best * 100.0 } else { 0.0 });
            }
        }
    }

    /// Compute statistics for each variant, best average length first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();
        for result in &self.results {
            stats_map.entry(result.algorithm.clone()).or_default().push(result);
        }

        let mut statistics = Vec::new();
        for (algo, results) in stats_map {
            let costs: Vec<f64> = results.iter().map(|r| r.cost).collect();
            let times: Vec<f64> = results.iter().map(|r| r.time).collect();
            let clones: Vec<f64> = results.iter().map(|r| r.clone_count as f64).collect();
            let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap_to_best).collect();

            let std_cost = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_instances: results.len(),
                num_complete: results.iter().filter(|r| r.complete).count(),
                avg_cost: costs.iter().mean(),
                best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                worst_cost: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                std_cost,
                avg_time: times.iter().mean(),
                total_time: times.iter().sum(),
                avg_clones: clones.iter().mean(),
                avg_gap: if gaps.is_empty() { None } else { Some(gaps.iter().mean()) },
            });
        }

        statistics.sort_by_key(|s| OrderedFloat(s.avg_cost));
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Branch TSP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

        report.push_str("Variant Performance Summary:\n");
        report.push_str("-".repeat(96).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<30} {:>9} {:>12} {:>12} {:>10} {:>10} {:>10}\n",
            "Algorithm", "Complete", "Avg Length", "Std Dev", "Avg Gap%", "Clones", "Avg Time"
        ));
        report.push_str("-".repeat(96).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<30} {:>9} {:>12.2} {:>12.2} {:>10} {:>10.1} {:>10.4}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_complete, stat.num_instances),
                stat.avg_cost,
                stat.std_cost,
                gap_str,
                stat.avg_clones,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(96).as_str());
        report.push('\n');

        report.push_str("\nBest Tours per Instance:\n");
        let mut instance_best: HashMap<&str, &AlgorithmResult> = HashMap::new();
        for result in self.results.iter().filter(|r| r.complete) {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }
        let mut names: Vec<&&str> = instance_best.keys().collect();
        names.sort();
        for name in names {
            let best = instance_best[*name];
            report.push_str(&format!("  {}: {:.2} ({})\n", name, best.cost, best.algorithm));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    /// Get best known values
    pub fn best_known(&self) -> &HashMap<String, f64> {
        &self.best_known
    }
}

/// Load every `.tsp` file of a directory, smallest first. Unreadable files are skipped.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<TSPInstance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "tsp").unwrap_or(false) {
            match TSPInstance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::warn!("skipping {}: {}", path.display(), e),
            }
        }
    }

    instances.sort_by_key(|i| i.dimension);
    Ok(instances)
}

/// `count` seeded uniform instances of `n` points
pub fn random_instances(count: usize, n: usize, side: f64, seed: u64) -> Vec<TSPInstance> {
    (0..count as u64)
        .map(|i| TSPInstance::random_uniform(n, side, seed + i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(parallel: bool) -> BenchmarkConfig {
        BenchmarkConfig {
            variants: vec![
                BranchSearchHeuristic::greedy().config,
                BranchSearchHeuristic::forking(Some(8)).config,
            ],
            parallel,
            threads: Some(2),
            show_progress: false,
            ..BenchmarkConfig::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.variants.len(), 4);
        assert!(config.parallel);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let instances = random_instances(3, 15, 100.0, 1);

        let mut sequential = Benchmark::new(small_config(false));
        sequential.run_on_instances(&instances).unwrap();
        let mut parallel = Benchmark::new(small_config(true));
        parallel.run_on_instances(&instances).unwrap();

        assert_eq!(sequential.results().len(), 6);
        let key = |r: &AlgorithmResult| (r.instance.clone(), r.algorithm.clone());
        let mut a: Vec<_> = sequential.results().iter().map(|r| (key(r), r.cost)).collect();
        let mut b: Vec<_> = parallel.results().iter().map(|r| (key(r), r.cost)).collect();
        a.sort_by(|x, y| x.0.cmp(&y.0));
        b.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_statistics_and_gaps() {
        let instances = random_instances(2, 12, 50.0, 9);
        let mut bench = Benchmark::new(small_config(false));
        bench.run_on_instances(&instances).unwrap();

        for result in bench.results() {
            let gap = result.gap_to_best.unwrap();
            assert!(gap >= -1e-9);
        }
        let stats = bench.compute_statistics();
        assert_eq!(stats.len(), 2);
        for stat in &stats {
            assert_eq!(stat.num_instances, 2);
            assert!(stat.best_cost <= stat.avg_cost && stat.avg_cost <= stat.worst_cost);
        }
        assert!(bench.generate_report().contains("Benchmark Report"));
    }

    #[test]
    fn test_best_known_sets_reference() {
        let instance = TSPInstance::from_coords("square", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let mut bench = Benchmark::new(small_config(false));
        bench.set_best_known("square", 2.0);
        bench.run_on_instances(&[instance]).unwrap();
        for result in bench.results() {
            assert!((result.gap_to_best.unwrap() - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_csv_export() {
        let dir = std::env::temp_dir().join("branch-tsp-benchmark-test");
        std::fs::create_dir_all(&dir).unwrap();
        let mut bench = Benchmark::new(small_config(false));
        bench.run_on_instances(&random_instances(1, 10, 20.0, 4)).unwrap();

        let path = dir.join("results.csv");
        bench.export_to_csv(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("algorithm,instance,dimension,cost"));
        assert_eq!(content.lines().count(), 3);
    }
}
