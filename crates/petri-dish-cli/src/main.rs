use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use petri_dish_core::{DishConfig, Occupant, Pattern, PetriDish, Projector};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

const WARMUP_GENERATIONS: usize = 10;
const BENCHMARK_GENERATIONS: usize = 200;
const TARGET_GPS: f64 = 60.0;

#[derive(Parser)]
#[command(name = "petri-dish")]
#[command(about = "Headless petri dish driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a random soup from a config file
    Run {
        /// Path to config file (JSON); defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the run summary (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of generations to advance
        #[arg(long, default_value_t = 1000)]
        generations: usize,

        /// Sample statistics every N generations
        #[arg(long, default_value_t = 100)]
        sample_every: usize,
    },
    /// Seed a plaintext pattern and print each generation
    Pattern {
        /// Plaintext pattern file (`O` alive, `.` dead, `!` comments)
        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value_t = 20)]
        width: usize,

        #[arg(long, default_value_t = 20)]
        height: usize,

        #[arg(long, default_value_t = 8)]
        generations: usize,
    },
    /// Measure generations per second on a few dish sizes
    Benchmark,
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

/// Draws live organisms as `O`, devices as `D` and everything else as `.`.
struct Ascii;

impl Projector for Ascii {
    type View = char;

    fn occupant(&self, occupant: &Occupant) -> Option<char> {
        match occupant {
            Occupant::Organism(organism) if organism.is_alive() => Some('O'),
            Occupant::Device(_) => Some('D'),
            Occupant::Empty | Occupant::Organism(_) | Occupant::Extent { .. } => None,
        }
    }
}

fn render(dish: &PetriDish) -> String {
    let width = dish.width();
    let mut canvas = vec!['.'; width * dish.height()];
    for projection in dish.project(&Ascii) {
        canvas[projection.y * width + projection.x] = projection.view;
    }
    let mut out = String::with_capacity(canvas.len() + dish.height());
    for row in canvas.chunks(width) {
        out.extend(row);
        out.push('\n');
    }
    out
}

fn load_config(path: Option<&Path>) -> Result<DishConfig> {
    let Some(path) = path else {
        return Ok(DishConfig::default());
    };
    let file = File::open(path).context("failed to open config file")?;
    let config: DishConfig =
        serde_json::from_reader(BufReader::new(file)).context("failed to parse config")?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

fn run_benchmark(width: usize, height: usize, seed: u64) -> Result<()> {
    let config = DishConfig {
        width,
        height,
        seed,
        ..DishConfig::default()
    };
    let mut dish = PetriDish::new(config).context("benchmark config validation error")?;
    dish.populate_random();

    for _ in 0..WARMUP_GENERATIONS {
        dish.advance();
    }

    let started = Instant::now();
    for _ in 0..BENCHMARK_GENERATIONS {
        dish.advance();
    }
    let elapsed = started.elapsed().as_secs_f64();
    let avg_us = elapsed * 1_000_000.0 / BENCHMARK_GENERATIONS as f64;
    let gps = BENCHMARK_GENERATIONS as f64 / elapsed.max(f64::EPSILON);

    println!("--- {width}x{height} dish ({} cells) ---", width * height);
    println!("  Avg generation: {avg_us:.0} us ({gps:.1} generations/sec)");
    let verdict = if gps >= TARGET_GPS { "GO" } else { "NO-GO" };
    println!("  Verdict:        {verdict} (target: >={TARGET_GPS} generations/sec)");
    println!("  Live organisms: {}", dish.stats().live_organisms);
    println!();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = DishConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Benchmark => {
            if cfg!(debug_assertions) {
                eprintln!("WARNING: running in debug mode. Results are not representative.");
                eprintln!("         Use: cargo run -p petri-dish-cli --release -- benchmark");
                eprintln!();
            }
            println!("=== Petri Dish Benchmark ===");
            println!(
                "Warmup: {WARMUP_GENERATIONS} generations, Benchmark: {BENCHMARK_GENERATIONS} generations"
            );
            println!();
            for (width, height) in [(64, 64), (160, 90), (320, 180)] {
                run_benchmark(width, height, 42)?;
            }
        }
        Commands::Run {
            config,
            out,
            generations,
            sample_every,
        } => {
            let config = load_config(config.as_deref())?;
            let mut dish = PetriDish::new(config).context("config validation error")?;
            dish.populate_random();
            info!(
                width = dish.width(),
                height = dish.height(),
                generations,
                "running random soup"
            );

            let summary = dish
                .run(generations, sample_every)
                .context("invalid run parameters")?;

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                println!("Run complete. Results saved to {:?}", out_dir);
            } else {
                println!(
                    "Run complete. Generation {}, live organisms: {}, cycles: {}, restarts: {}",
                    summary.final_stats.generation,
                    summary.final_stats.live_organisms,
                    summary.cycles.len(),
                    summary.restarts
                );
            }
        }
        Commands::Pattern {
            file,
            width,
            height,
            generations,
        } => {
            let text = std::fs::read_to_string(&file).context("failed to read pattern file")?;
            let pattern = Pattern::parse(&text).context("failed to parse pattern")?;
            let config = DishConfig {
                width,
                height,
                ..DishConfig::default()
            };
            let mut dish = PetriDish::new(config).context("config validation error")?;
            let origin = (
                width.saturating_sub(pattern.width()) / 2,
                height.saturating_sub(pattern.height()) / 2,
            );
            dish.populate_pattern(&pattern, origin)
                .context("pattern does not fit the dish")?;

            println!("generation 0");
            print!("{}", render(&dish));
            for _ in 0..generations {
                let cycle = dish.advance();
                println!("generation {}", dish.generation());
                print!("{}", render(&dish));
                if cycle.is_some() {
                    if let Some(message) = dish.message() {
                        println!("{message}");
                    }
                    break;
                }
            }
        }
    }
    Ok(())
}
