use chrono::Local;
use colored::Colorize;
use csv::Writer;
use itertools::iproduct;
use log::{info, Level, LevelFilter, Metadata, Record};
use rand::prelude::*;
use reoffer_optimizer::comparison::{Aggregate, Summary};
use reoffer_optimizer::demo_data::{demo_dataset, DemoShape};
use reoffer_optimizer::export::{write_comparison, write_disciplines, write_history};
use reoffer_optimizer::loader::SheetLoader;
use reoffer_optimizer::statistics::DatasetOverview;
use reoffer_optimizer::visualization::plot_convergence;
use reoffer_optimizer::{Comparator, Dataset, GeneticOptimizer, ReofferConfig};
use serde::Serialize;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::Instant;

const REPETITIONS: u64 = 5;
const DEFAULT_SEED: u64 = 42;

struct ColoredLogger;

impl log::Log for ColoredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        let line = match record.level() {
            Level::Error => message.bold().red(),
            Level::Warn => message.yellow(),
            _ if message.starts_with("Generation") => message.bold().red(),
            _ => message.normal(),
        };
        println!("{}", line);
    }

    fn flush(&self) {}
}

static LOGGER: ColoredLogger = ColoredLogger;

fn install_logger() -> Result<(), String> {
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(LevelFilter::Info))
        .map_err(|e| e.to_string())
}

#[derive(Debug, Default)]
struct Args {
    sheet: Option<String>,
    seed: Option<u64>,
    sweep: bool,
}

impl Args {
    fn parse() -> Result<Self, Box<dyn Error>> {
        let mut args = Args::default();
        let mut raw = std::env::args().skip(1);

        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--sweep" => args.sweep = true,
                "--seed" => {
                    let value = raw.next().ok_or("--seed expects a number")?;
                    args.seed = Some(value.parse()?);
                }
                _ => args.sheet = Some(arg),
            }
        }

        Ok(args)
    }
}

#[derive(Debug, Serialize)]
pub struct SweepResult {
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub max_disciplines: usize,
    pub repetitions: u64,
    pub mean_fitness: f64,
    pub mean_benefited: f64,
    pub mean_runtime: f64,
    pub var_fitness: f64,
    pub var_benefited: f64,
    pub var_runtime: f64,
}

#[derive(Debug)]
pub struct SweepSchema {
    crossover_rate: Vec<f64>,
    mutation_rate: Vec<f64>,
    max_disciplines: Vec<usize>,
}

fn mean_variance(values: &[f64]) -> (f64, f64) {
    let aggregate = Aggregate::of(values);
    (aggregate.mean, aggregate.std_dev * aggregate.std_dev)
}

fn sweep(
    dataset: &Dataset,
    schema: &SweepSchema,
    seed: u64,
    file_path: &str,
) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;
    let mut writer = Writer::from_writer(file);

    for (&crossover_rate, &mutation_rate, &max_disciplines) in iproduct!(
        &schema.crossover_rate,
        &schema.mutation_rate,
        &schema.max_disciplines
    ) {
        let config = ReofferConfig {
            crossover_rate,
            mutation_rate,
            max_disciplines,
            ..Default::default()
        };
        let optimizer = GeneticOptimizer::new(config, dataset)?;

        info!(
            "Scenario crossover={} mutation={} maxDisciplines={} is being run...",
            crossover_rate, mutation_rate, max_disciplines
        );

        let mut fitness_values = Vec::with_capacity(REPETITIONS as usize);
        let mut benefited_values = Vec::with_capacity(REPETITIONS as usize);
        let mut runtime_values = Vec::with_capacity(REPETITIONS as usize);

        for repetition in 0..REPETITIONS {
            let mut rng = StdRng::seed_from_u64(seed + repetition);

            let start = Instant::now();
            let report = optimizer.optimize(&mut rng);
            runtime_values.push(start.elapsed().as_secs_f64());

            fitness_values.push(report.best_evaluation.fitness);
            benefited_values.push(report.best_evaluation.benefited_students as f64);
        }

        let (mean_fitness, var_fitness) = mean_variance(&fitness_values);
        let (mean_benefited, var_benefited) = mean_variance(&benefited_values);
        let (mean_runtime, var_runtime) = mean_variance(&runtime_values);

        writer.serialize(SweepResult {
            crossover_rate,
            mutation_rate,
            max_disciplines,
            repetitions: REPETITIONS,
            mean_fitness,
            mean_benefited,
            mean_runtime,
            var_fitness,
            var_benefited,
            var_runtime,
        })?;
        writer.flush()?;
    }

    Ok(())
}

fn print_overview(overview: &DatasetOverview) {
    println!("{}", "Dataset".bold());
    println!("  disciplines:           {}", overview.total_disciplines);
    println!("  students with failures: {}", overview.total_students);
    println!(
        "  failures per student:  {:.2}",
        overview.mean_failures_per_student
    );
    println!(
        "  most failed:           {} ({} students)",
        overview.most_failed_discipline.code, overview.most_failed_discipline.failed_student_count
    );
}

fn print_row(name: &str, summary: &Summary) {
    println!(
        "  {:<10} {:>10.1} {:>9.1}% {:>10.1} {:>12.1}",
        name,
        summary.students_helped,
        summary.coverage_percent,
        summary.slots_attended,
        summary.fitness
    );
}

fn run(dataset: &Dataset, seed: u64, date_str: &str) -> Result<(), Box<dyn Error>> {
    let config = ReofferConfig::default();
    let mut rng = StdRng::seed_from_u64(seed);

    let optimizer = GeneticOptimizer::new(config.clone(), dataset)?;
    let report = optimizer.optimize(&mut rng);

    let comparator = Comparator::new(&config)?;
    let comparison = comparator.compare(dataset, &report, &mut rng);

    println!();
    println!("{}", "Strategy comparison".bold());
    println!(
        "  {:<10} {:>10} {:>10} {:>10} {:>12}",
        "strategy", "students", "coverage", "slots", "fitness"
    );
    print_row("genetic", &comparison.genetic);
    print_row("greedy", &comparison.greedy);
    print_row("random", &comparison.random);

    let gain = comparison.genetic.students_helped - comparison.greedy.students_helped;
    let gain_line = format!("  GA helps {:+.0} students compared to greedy", gain);
    if gain >= 0.0 {
        println!("{}", gain_line.green());
    } else {
        println!("{}", gain_line.yellow());
    }

    println!();
    println!("{}", "Disciplines to re-offer".bold());
    for discipline in report.selected_disciplines.iter() {
        println!(
            "  {} {} (semester {}, {} students)",
            discipline.code.cyan(),
            discipline.name,
            discipline.semester(),
            discipline.failed_student_count
        );
    }

    let efficiency = &report.statistics.efficiency;
    println!(
        "  {:.1}% of students helped, {:.2} slots per helped student",
        efficiency.benefited_percent, efficiency.slots_per_benefited_student
    );

    write_history(
        &report.history,
        File::create(format!("history_{}.csv", date_str))?,
    )?;
    write_comparison(
        &comparison,
        File::create(format!("comparison_{}.csv", date_str))?,
    )?;
    write_disciplines(
        &report.selected_disciplines,
        File::create(format!("disciplines_{}.csv", date_str))?,
    )?;

    let chart = format!("convergence_{}.png", date_str);
    plot_convergence(&report.history, Path::new(&chart))?;
    info!("Results written with suffix {}", date_str);

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    install_logger()?;

    let args = Args::parse()?;
    let seed = args.seed.unwrap_or(DEFAULT_SEED);

    let dataset = match &args.sheet {
        Some(path) => SheetLoader::default().load_path(path)?,
        None => {
            info!("No sheet given, generating a demo roster");
            demo_dataset(DemoShape::default(), &mut StdRng::seed_from_u64(seed))?
        }
    };
    print_overview(&DatasetOverview::of(&dataset));

    let now = Local::now();
    let date_str = now.format("%Y-%m-%d_%H-%M-%S").to_string();

    if args.sweep {
        let schema = SweepSchema {
            crossover_rate: vec![0.6, 0.8, 0.95],
            mutation_rate: vec![0.05, 0.2, 0.4],
            max_disciplines: vec![5, 10, 15],
        };
        let filename = format!("sweep_results_{}.csv", date_str);
        sweep(&dataset, &schema, seed, &filename)?;
        info!("Sweep written to {}", filename);
        return Ok(());
    }

    run(&dataset, seed, &date_str)
}
