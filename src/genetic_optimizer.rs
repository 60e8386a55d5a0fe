use crate::error::{OptimizerError, Result};
use crate::fitness::{Evaluation, FitnessEvaluator};
use crate::genetic_algorithm::{Algorithm, Chromosome, Meta, Termination};
use crate::model::{Dataset, Discipline};
use crate::statistics::Statistics;
use log::info;
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Parameter bundle shared by the GA and the comparison baselines.
///
/// Absent fields deserialize to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReofferConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// Hard cap on re-offered disciplines; exceeding it is penalized.
    pub max_disciplines: usize,
    pub weight_students: f64,
    pub weight_slots: f64,
    pub penalty_rate: f64,
    pub num_random_trials: usize,
    pub tournament_size: usize,
    /// Fraction of the population copied unchanged into the next generation.
    pub elitism_rate: f64,
}

impl Default for ReofferConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 50,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            max_disciplines: 10,
            weight_students: 100.0,
            weight_slots: 1.0,
            penalty_rate: 1000.0,
            num_random_trials: 100,
            tournament_size: 3,
            elitism_rate: 0.1,
        }
    }
}

impl ReofferConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(invalid("populationSize", "must be at least 1"));
        }
        if self.max_generations == 0 {
            return Err(invalid("maxGenerations", "must be at least 1"));
        }
        if self.tournament_size == 0 {
            return Err(invalid("tournamentSize", "must be at least 1"));
        }
        if self.num_random_trials == 0 {
            return Err(invalid("numRandomTrials", "must be at least 1"));
        }

        for (name, rate) in [
            ("crossoverRate", self.crossover_rate),
            ("mutationRate", self.mutation_rate),
            ("elitismRate", self.elitism_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid(name, format!("must be within [0, 1], got {}", rate)));
            }
        }

        for (name, weight) in [
            ("weightStudents", self.weight_students),
            ("weightSlots", self.weight_slots),
            ("penaltyRate", self.penalty_rate),
        ] {
            if !weight.is_finite() {
                return Err(invalid(name, format!("must be finite, got {}", weight)));
            }
        }

        Ok(())
    }

    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elitism_rate).floor() as usize
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> OptimizerError {
    OptimizerError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

impl Meta for ReofferConfig {
    fn population_size(&self) -> usize {
        self.population_size
    }

    fn max_generations(&self) -> usize {
        self.max_generations
    }
}

/// A candidate set of disciplines to re-offer, one bit per dataset discipline.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReofferPlan {
    pub genes: Vec<bool>,
    pub fitness: f64,
    pub benefited_students: usize,
    pub satisfied_slots: usize,
    pub selected_count: usize,
}

impl ReofferPlan {
    pub fn from_genes(genes: Vec<bool>) -> Self {
        Self {
            genes,
            ..Default::default()
        }
    }
}

impl Chromosome for ReofferPlan {
    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn genes(&self) -> &[bool] {
        &self.genes
    }
}

#[derive(Debug)]
pub struct ReofferAlgorithm<'d> {
    pub config: ReofferConfig,
    pub evaluator: FitnessEvaluator,
    pub dataset: &'d Dataset,
}

impl<'d> ReofferAlgorithm<'d> {
    pub fn new(config: ReofferConfig, dataset: &'d Dataset) -> Self {
        let evaluator = FitnessEvaluator::from_config(&config);
        Self {
            config,
            evaluator,
            dataset,
        }
    }
}

impl Algorithm<ReofferConfig, ReofferPlan> for ReofferAlgorithm<'_> {
    fn meta(&self) -> &ReofferConfig {
        &self.config
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec<ReofferPlan> {
        let length = self.dataset.disciplines().len();

        (0..self.config.population_size)
            .map(|_| {
                let target = rng.gen_range(0..=self.config.max_disciplines).min(length);
                let mut indices: Vec<usize> = (0..length).collect();
                indices.shuffle(&mut *rng);

                let mut genes = vec![false; length];
                for &index in indices.iter().take(target) {
                    genes[index] = true;
                }

                ReofferPlan::from_genes(genes)
            })
            .collect()
    }

    fn evaluate(&self, mut population: Vec<ReofferPlan>) -> Vec<ReofferPlan> {
        population.par_iter_mut().for_each(|plan| {
            let evaluation = self.evaluator.evaluate(&plan.genes, self.dataset);

            plan.fitness = evaluation.fitness;
            plan.benefited_students = evaluation.benefited_students;
            plan.satisfied_slots = evaluation.satisfied_slots;
            plan.selected_count = evaluation.selected_count;
        });

        // Stable, so equally fit plans keep their relative order
        population.sort_by(|a, b| {
            b.fitness()
                .partial_cmp(&a.fitness())
                .unwrap_or(Ordering::Equal)
        });

        population
    }

    fn select(&self, chromosomes: &[ReofferPlan], rng: &mut dyn RngCore) -> ReofferPlan {
        // Draws are with replacement, a plan may compete against itself
        let mut best = rng.gen_range(0..chromosomes.len());

        for _ in 1..self.config.tournament_size {
            let current = rng.gen_range(0..chromosomes.len());
            if chromosomes[current].fitness > chromosomes[best].fitness {
                best = current;
            }
        }

        chromosomes[best].clone()
    }

    fn crossover(
        &self,
        parent_1: &ReofferPlan,
        parent_2: &ReofferPlan,
        rng: &mut dyn RngCore,
    ) -> (ReofferPlan, ReofferPlan) {
        if rng.gen::<f64>() >= self.config.crossover_rate {
            return (
                ReofferPlan::from_genes(parent_1.genes.clone()),
                ReofferPlan::from_genes(parent_2.genes.clone()),
            );
        }

        perform_single_point_crossover(parent_1, parent_2, rng)
    }

    fn mutate(&self, mut chromosome: ReofferPlan, rng: &mut dyn RngCore) -> ReofferPlan {
        for gene in chromosome.genes.iter_mut() {
            if rng.gen::<f64>() < self.config.mutation_rate {
                *gene = !*gene;
            }
        }

        chromosome
    }

    fn elitism(&self, population: &[ReofferPlan]) -> Vec<ReofferPlan> {
        population[..std::cmp::min(self.config.elite_count(), population.len())].to_vec()
    }
}

fn perform_single_point_crossover(
    parent_1: &ReofferPlan,
    parent_2: &ReofferPlan,
    rng: &mut dyn RngCore,
) -> (ReofferPlan, ReofferPlan) {
    let length = parent_1.genes().len();
    let crossover_point = rng.gen_range(0..length);

    let mut genes_1 = Vec::with_capacity(length);
    let mut genes_2 = Vec::with_capacity(length);

    genes_1.extend_from_slice(&parent_1.genes()[..crossover_point]);
    genes_2.extend_from_slice(&parent_2.genes()[..crossover_point]);
    genes_1.extend_from_slice(&parent_2.genes()[crossover_point..]);
    genes_2.extend_from_slice(&parent_1.genes()[crossover_point..]);

    (ReofferPlan::from_genes(genes_1), ReofferPlan::from_genes(genes_2))
}

/// Runs for a fixed number of generations.
#[derive(Clone, Copy, Debug)]
pub struct GenerationLimit {
    pub max_generations: usize,
}

impl Termination<ReofferPlan> for GenerationLimit {
    fn can_terminate(&mut self, _chromosomes: &[ReofferPlan], generation: usize) -> bool {
        generation + 1 >= self.max_generations
    }
}

/// Progress snapshot appended once per generation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    /// 1-based generation number.
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub benefited_students: usize,
    pub selected_count: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaReport {
    pub best_selection: Vec<bool>,
    pub best_evaluation: Evaluation,
    pub selected_disciplines: Vec<Discipline>,
    pub statistics: Statistics,
    pub history: Vec<GenerationRecord>,
    pub parameters_used: ReofferConfig,
}

/// Generational GA over discipline selections.
///
/// The optimizer keeps no state between runs; population, best plan and
/// history all live inside a single call to [`GeneticOptimizer::optimize`].
#[derive(Debug)]
pub struct GeneticOptimizer<'d> {
    pub algorithm: ReofferAlgorithm<'d>,
}

impl<'d> GeneticOptimizer<'d> {
    pub fn new(config: ReofferConfig, dataset: &'d Dataset) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            algorithm: ReofferAlgorithm::new(config, dataset),
        })
    }

    pub fn optimize(&self, rng: &mut dyn RngCore) -> GaReport {
        let mut limit = GenerationLimit {
            max_generations: self.algorithm.meta().max_generations(),
        };
        self.optimize_with(rng, &mut limit)
    }

    /// Like [`GeneticOptimizer::optimize`] but asks `termination` after every
    /// generation whether to stop. Always runs at least one generation.
    pub fn optimize_with(
        &self,
        rng: &mut dyn RngCore,
        termination: &mut dyn Termination<ReofferPlan>,
    ) -> GaReport {
        let config = self.algorithm.meta();
        let dataset = self.algorithm.dataset;
        let total_students = dataset.students().len();

        info!(
            "Starting genetic algorithm with {} students and {} disciplines",
            total_students,
            dataset.disciplines().len()
        );

        let mut generation = 0;
        let mut population = self.algorithm.generate(rng);
        let mut best = ReofferPlan {
            fitness: f64::NEG_INFINITY,
            ..Default::default()
        };
        let mut history = Vec::with_capacity(config.max_generations);

        loop {
            population = self.algorithm.evaluate(population);

            // Strict comparison, ties keep the plan found first
            if population[0].fitness > best.fitness {
                best = population[0].clone();
            }

            let mean_fitness =
                population.iter().map(|p| p.fitness).sum::<f64>() / population.len() as f64;

            history.push(GenerationRecord {
                generation: generation + 1,
                best_fitness: best.fitness,
                mean_fitness,
                benefited_students: best.benefited_students,
                selected_count: best.selected_count,
            });

            if generation % 10 == 0 || generation + 1 == config.max_generations {
                info!(
                    "Generation {}: fitness={}, students={}/{}",
                    generation + 1,
                    best.fitness,
                    best.benefited_students,
                    total_students
                );
            }

            if termination.can_terminate(&population, generation) {
                break;
            }

            population = self.next_generation(&population, rng);
            generation += 1;
        }

        let best_selection = best.genes;
        let best_evaluation = self.algorithm.evaluator.evaluate(&best_selection, dataset);
        let statistics = Statistics::from_evaluation(&best_evaluation, dataset);

        info!(
            "Optimization finished: {}/{} students benefited",
            best_evaluation.benefited_students, total_students
        );

        GaReport {
            selected_disciplines: dataset.selected_disciplines(&best_selection),
            best_selection,
            best_evaluation,
            statistics,
            history,
            parameters_used: config.clone(),
        }
    }

    /// Builds the next population from an evaluated one (best first): elites
    /// are carried over unchanged, the rest are tournament-selected, crossed
    /// over and mutated children.
    pub fn next_generation(
        &self,
        evaluated: &[ReofferPlan],
        rng: &mut dyn RngCore,
    ) -> Vec<ReofferPlan> {
        let population_size = self.algorithm.meta().population_size();
        let mut population = self.algorithm.elitism(evaluated);
        population.reserve(population_size.saturating_sub(population.len()));

        while population.len() < population_size {
            let parent_1 = self.algorithm.select(evaluated, rng);
            let parent_2 = self.algorithm.select(evaluated, rng);

            let (child_1, child_2) = self.algorithm.crossover(&parent_1, &parent_2, rng);
            let child_1 = self.algorithm.mutate(child_1, rng);
            let child_2 = self.algorithm.mutate(child_2, rng);

            population.push(child_1);
            if population.len() < population_size {
                population.push(child_2);
            }
        }

        population
    }
}
