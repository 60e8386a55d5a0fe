use rand::RngCore;
use std::fmt::Debug;

// This trait represents a chromosome - a single candidate solution
// to the problem we're solving
pub trait Chromosome: Send + Sync + Debug + Clone {
    fn fitness(&self) -> f64;
    fn genes(&self) -> &[bool];
}

// This trait represents a configuration of the algorithm
pub trait Meta: Send + Sync + Debug + Clone {
    fn population_size(&self) -> usize;
    fn max_generations(&self) -> usize;
}

// This trait represents the stopping condition of the algorithm. It sees the
// evaluated population after every generation.
pub trait Termination<C: Chromosome>: Debug {
    fn can_terminate(&mut self, chromosomes: &[C], generation: usize) -> bool;
}

// This trait encapsulates the underlying genetic algorithm operators used by
// the optimizer. Randomness always comes from the caller.
pub trait Algorithm<M: Meta, C: Chromosome>: Send + Sync + Debug {
    fn meta(&self) -> &M;
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<C>;
    // Scores every chromosome and orders the population best first
    fn evaluate(&self, population: Vec<C>) -> Vec<C>;
    fn select(&self, chromosomes: &[C], rng: &mut dyn RngCore) -> C;
    fn crossover(&self, parent_1: &C, parent_2: &C, rng: &mut dyn RngCore) -> (C, C);
    fn mutate(&self, chromosome: C, rng: &mut dyn RngCore) -> C;
    fn elitism(&self, population: &[C]) -> Vec<C>;
}
