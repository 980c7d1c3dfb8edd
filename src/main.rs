//! Branch TSP Solver - Command Line Interface
//!
//! Euclidean TSP heuristic: convex perimeter insertion explored as a forest of forking branches.

use branch_tsp_solver::benchmark::{load_instances_from_dir, random_instances, Benchmark, BenchmarkConfig};
use branch_tsp_solver::config::SolverConfig;
use branch_tsp_solver::error::{Error, Result};
use branch_tsp_solver::heuristics::construction::*;
use branch_tsp_solver::heuristics::perimeter::build_perimeter;
use branch_tsp_solver::heuristics::search::{SearchConfig, DEFAULT_CLONE_CEILING};
use branch_tsp_solver::instance::TSPInstance;
use branch_tsp_solver::logging::init_logger;
use branch_tsp_solver::visualization::Visualizer;
use clap::{Parser, Subcommand, ValueEnum};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "branch-tsp-solver")]
#[command(version = "1.0")]
#[command(about = "Euclidean TSP solver built on convex-perimeter insertion with forking branches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON solver configuration; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one instance
    Solve {
        /// TSPLIB instance file
        #[arg(short, long, conflicts_with = "random")]
        instance: Option<PathBuf>,

        /// Solve a random uniform instance with this many points instead
        #[arg(long)]
        random: Option<usize>,

        /// Side of the square random points are drawn from
        #[arg(long, default_value = "1000")]
        side: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Search variant
        #[arg(short, long, value_enum)]
        variant: Option<Variant>,

        /// Maximum number of live branches
        #[arg(long)]
        clone_ceiling: Option<usize>,

        /// Fork on first placements as well as relocations
        #[arg(long)]
        fork_first: bool,

        /// Relocate attached points
        #[arg(long, conflicts_with = "no_relocation")]
        relocation: bool,

        /// Never relocate attached points
        #[arg(long)]
        no_relocation: bool,

        /// Stop after this many search iterations
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Output solution to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generate SVG visualization
        #[arg(long)]
        visualize: bool,

        /// Also convert the visualization to PNG
        #[arg(long, requires = "visualize")]
        png: bool,

        /// Write point and tour data for external plotting
        #[arg(long)]
        plot_data: Option<PathBuf>,

        /// Verbose output
        #[arg(long)]
        verbose: bool,
    },

    /// Run benchmarks on a directory of instances or on random instances
    Benchmark {
        /// Directory containing .tsp files
        #[arg(short, long, conflicts_with = "random")]
        dir: Option<PathBuf>,

        /// Number of random instances to generate instead
        #[arg(long)]
        random: Option<usize>,

        /// Points per random instance
        #[arg(long, default_value = "100")]
        points: usize,

        /// Seed of the first random instance
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Run instances one after another
        #[arg(long)]
        sequential: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Write a random instance in TSPLIB format
    Generate {
        /// Number of points
        #[arg(short, long)]
        points: usize,

        /// Side of the square the points are drawn from
        #[arg(long, default_value = "1000")]
        side: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Variant {
    /// Cheapest insertion, no relocation
    Greedy,
    /// Cheapest insertion with relocation
    Relocating,
    /// Fork on every placement
    Forking,
    /// Run the standard variants and keep the best
    Multi,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => SolverConfig::from_file(path)?,
        None => SolverConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logger(config.level_filter()?, config.log_timestamps)?;

    match cli.command {
        Commands::Solve {
            instance,
            random,
            side,
            seed,
            variant,
            clone_ceiling,
            fork_first,
            relocation,
            no_relocation,
            max_iterations,
            output,
            visualize,
            png,
            plot_data,
            verbose,
        } => {
            let (instance, base_path) = match (instance, random) {
                (Some(path), _) => {
                    println!("Loading instance from {:?}...", path);
                    (TSPInstance::from_file(&path)?, path)
                }
                (None, Some(n)) => {
                    let instance = TSPInstance::random_uniform(n, side, seed);
                    let path = PathBuf::from(format!("{}.tsp", instance.name));
                    (instance, path)
                }
                (None, None) => return Err(Error::config("either --instance or --random is required")),
            };

            let mut search = config.search;
            match variant {
                Some(Variant::Greedy) => search = BranchSearchHeuristic::greedy().config,
                Some(Variant::Relocating) => {
                    let ceiling = search.clone_ceiling;
                    search = BranchSearchHeuristic::relocating().config;
                    if ceiling.is_some() {
                        search.clone_ceiling = ceiling;
                    }
                }
                Some(Variant::Forking) => {
                    let ceiling = search.clone_ceiling.or(Some(DEFAULT_CLONE_CEILING));
                    search = BranchSearchHeuristic::forking(ceiling).config;
                }
                Some(Variant::Multi) | None => {}
            }
            if let Some(ceiling) = clone_ceiling {
                search.clone_ceiling = Some(ceiling);
            }
            if fork_first {
                search.branch.fork_on_first_placement = true;
            }
            if relocation {
                search.branch.relocation = true;
            }
            if no_relocation {
                search.branch.relocation = false;
            }
            let forks = search.branch.relocation || search.branch.fork_on_first_placement;
            if forks && search.clone_ceiling.is_none() && instance.dimension > 20 {
                log::warn!(
                    "forking search over {} points without --clone-ceiling may not finish",
                    instance.dimension
                );
            }
            if max_iterations.is_some() {
                search.max_iterations = max_iterations;
            }

            let options = SolveOptions {
                multi: variant == Some(Variant::Multi),
                output,
                visualize,
                png,
                plot_data,
                verbose,
            };
            solve_instance(&instance, &base_path, search, options)
        }

        Commands::Benchmark {
            dir,
            random,
            points,
            seed,
            output,
            max_size,
            threads,
            sequential,
            no_progress,
        } => {
            let mut instances = match (dir, random) {
                (Some(dir), _) => {
                    println!("Loading instances from {:?}...", dir);
                    load_instances_from_dir(&dir)?
                }
                (None, Some(count)) => random_instances(count, points, 1000.0, seed),
                (None, None) => return Err(Error::config("either --dir or --random is required")),
            };
            if let Some(max) = max_size {
                instances.retain(|i| i.dimension <= max);
            }

            let config = BenchmarkConfig {
                parallel: !sequential,
                threads,
                show_progress: !no_progress,
                output_dir: output.to_string_lossy().to_string(),
                ..BenchmarkConfig::default()
            };
            run_benchmark(&instances, config)
        }

        Commands::Analyze { instance } => analyze_instance(&instance, config.search),

        Commands::Generate {
            points,
            side,
            seed,
            output,
        } => {
            let instance = TSPInstance::random_uniform(points, side, seed);
            instance.save(&output)?;
            println!("Wrote {} points to {:?}", points, output);
            Ok(())
        }
    }
}

struct SolveOptions {
    multi: bool,
    output: Option<PathBuf>,
    visualize: bool,
    png: bool,
    plot_data: Option<PathBuf>,
    verbose: bool,
}

fn solve_instance(instance: &TSPInstance, path: &Path, search: SearchConfig, options: SolveOptions) -> Result<()> {
    if options.verbose {
        println!("{}", instance.statistics());
        println!("Search config: {:?}", search);
    }

    let solution = if options.multi {
        println!("Solving with the standard variants...");
        MultiVariantSearch::with_standard_variants().construct(instance)
    } else {
        let heuristic = BranchSearchHeuristic::new(search);
        println!("Solving with {}...", heuristic.name());
        heuristic.construct(instance)
    };

    println!("\n========== Results ==========");
    println!("Algorithm: {}", solution.algorithm);
    println!("Length: {:.4}", solution.cost);
    println!("Complete: {}", solution.complete);
    println!("Time: {:.4}s", solution.computation_time);
    println!("Iterations: {}", solution.iterations);
    println!("Clones: {} ({} pruned)", solution.clone_count, solution.pruned_count);
    if !solution.complete {
        println!("Iteration limit reached; the tour covers {} of {} points", solution.tour.len(), instance.dimension);
    }

    if options.verbose {
        println!("\nTour: {:?}", solution.tour);
    }

    if let Some(out_path) = &options.output {
        solution.save_json(out_path)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    let perimeter = build_perimeter(&instance.points);
    let viz = Visualizer::new();

    if let Some(data_path) = &options.plot_data {
        std::fs::write(data_path, viz.export_plot_data(instance, &solution, &perimeter))?;
        println!("Plot data saved to {:?}", data_path);
    }

    if options.visualize {
        let svg = viz.generate_svg(instance, &solution, &perimeter);
        let svg_path = path.with_extension("svg");
        viz.save_svg(&svg, &svg_path)?;
        println!("Visualization saved to {:?}", svg_path);

        if options.png {
            let png_path = path.with_extension("png");
            match viz.save_png(&svg, &png_path) {
                Ok(()) => println!("PNG saved to {:?}", png_path),
                Err(e) => println!("PNG conversion failed ({}). SVG kept at {:?}", e, svg_path),
            }
        }
    }

    Ok(())
}

fn run_benchmark(instances: &[TSPInstance], config: BenchmarkConfig) -> Result<()> {
    println!("Found {} instances", instances.len());
    if instances.is_empty() {
        return Err(Error::invalid_instance("no instances to benchmark"));
    }

    let output = PathBuf::from(&config.output_dir);
    std::fs::create_dir_all(&output)?;

    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(instances)?;

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);
    Ok(())
}

fn analyze_instance(path: &Path, search: SearchConfig) -> Result<()> {
    let instance = TSPInstance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let perimeter = build_perimeter(&instance.points);
    let hull_length = instance.tour_length(&perimeter.order);
    println!("Convex Perimeter:");
    println!("  Perimeter points: {}", perimeter.order.len());
    println!("  Interior points: {}", perimeter.unattached.len());
    println!("  Perimeter length: {:.2}", hull_length);

    let greedy = BranchSearchHeuristic::greedy().construct(&instance);
    let configured = BranchSearchHeuristic::new(search).construct(&instance);

    println!("\nQuick Solution Estimates:");
    println!(
        "  {}: {:.2} (+{:.1}% over perimeter)",
        greedy.algorithm,
        greedy.cost,
        greedy.gap_to(hull_length)
    );
    println!(
        "  {}: {:.2} ({} clones)",
        configured.algorithm, configured.cost, configured.clone_count
    );
    Ok(())
}
