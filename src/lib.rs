//! Chooses which failed disciplines to re-offer in a special term so that as
//! many students as possible can catch up.
//!
//! A selection is a bit vector over the dataset's disciplines. The
//! [`GeneticOptimizer`] searches that space and the [`Comparator`] scores the
//! result against greedy and random baselines under the same
//! [`FitnessEvaluator`].

pub mod comparison;
pub mod demo_data;
pub mod error;
pub mod export;
pub mod fitness;
pub mod genetic_algorithm;
pub mod genetic_optimizer;
pub mod loader;
pub mod model;
pub mod statistics;
pub mod visualization;

pub use comparison::{Comparator, Comparison};
pub use error::{OptimizerError, Result};
pub use fitness::{Evaluation, FitnessEvaluator};
pub use genetic_optimizer::{GaReport, GeneticOptimizer, ReofferConfig};
pub use model::{Dataset, Discipline, Student};
