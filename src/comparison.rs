//! Baseline strategies used to validate the GA.
//!
//! Both baselines pick at most `max_disciplines` disciplines and are scored with
//! the same [`FitnessEvaluator`] as the GA:
//!
//! - greedy: the disciplines with the most failed students;
//! - random: many uniformly random picks among disciplines with failures,
//!   summarized by mean/min/max/standard deviation.

use crate::error::Result;
use crate::fitness::{Evaluation, FitnessEvaluator};
use crate::genetic_optimizer::{GaReport, ReofferConfig};
use crate::model::{Dataset, Discipline};
use itertools::{Itertools, MinMaxResult};
use log::debug;
use rand::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

/// Outcome of a single deterministic selection.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub name: String,
    pub description: String,
    pub selected_disciplines: Vec<Discipline>,
    pub evaluation: Evaluation,
}

/// One random pick and its score.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    /// 1-based trial number.
    pub trial: usize,
    pub selected_disciplines: Vec<Discipline>,
    pub evaluation: Evaluation,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl Aggregate {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                min: 0.0,
                max: 0.0,
                std_dev: 0.0,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        let (min, max) = match values.iter().copied().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => (0.0, 0.0),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(min, max) => (min, max),
        };

        Self {
            mean,
            min,
            max,
            std_dev: variance.sqrt(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialStatistics {
    pub benefited_students: Aggregate,
    pub satisfied_slots: Aggregate,
    pub fitness: Aggregate,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomSamplingResult {
    pub name: String,
    pub description: String,
    pub statistics: TrialStatistics,
    pub best: Trial,
    pub worst: Trial,
    pub trials: Vec<Trial>,
}

/// Headline figures of one strategy in the side-by-side comparison.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub students_helped: f64,
    pub coverage_percent: f64,
    pub slots_attended: f64,
    pub fitness: f64,
}

impl Summary {
    fn of(evaluation: &Evaluation) -> Self {
        Self {
            students_helped: evaluation.benefited_students as f64,
            coverage_percent: evaluation.coverage_percent(),
            slots_attended: evaluation.satisfied_slots as f64,
            fitness: evaluation.fitness,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonDetail {
    pub greedy: StrategyResult,
    pub random: RandomSamplingResult,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub genetic: Summary,
    pub greedy: Summary,
    /// Means over all random trials.
    pub random: Summary,
    pub detail: ComparisonDetail,
}

/// Runs the baselines with the scoring configuration of a GA run.
///
/// Only constructible through [`Comparator::new`], which guarantees at least one
/// random trial.
#[derive(Clone, Copy, Debug)]
pub struct Comparator {
    evaluator: FitnessEvaluator,
    max_disciplines: usize,
    num_trials: usize,
}

impl Comparator {
    pub fn new(config: &ReofferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            evaluator: FitnessEvaluator::from_config(config),
            max_disciplines: config.max_disciplines,
            num_trials: config.num_random_trials,
        })
    }

    /// Picks the `max_disciplines` disciplines with the most failed students.
    pub fn greedy(&self, dataset: &Dataset) -> StrategyResult {
        let mut ranked: Vec<(usize, &Discipline)> =
            dataset.disciplines().iter().enumerate().collect();
        ranked.sort_by(|(_, a), (_, b)| b.failed_student_count.cmp(&a.failed_student_count));

        let mut genes = vec![false; dataset.disciplines().len()];
        for &(index, _) in ranked.iter().take(self.max_disciplines) {
            genes[index] = true;
        }

        let evaluation = self.evaluator.evaluate(&genes, dataset);
        debug!(
            "Greedy baseline: {} students, fitness {}",
            evaluation.benefited_students, evaluation.fitness
        );

        StrategyResult {
            name: "Greedy priority".to_string(),
            description: format!(
                "Top {} disciplines by failure count",
                self.max_disciplines
            ),
            selected_disciplines: dataset.selected_disciplines(&genes),
            evaluation,
        }
    }

    /// Scores `num_trials` random picks among the disciplines with failures.
    pub fn random(&self, dataset: &Dataset, rng: &mut dyn RngCore) -> RandomSamplingResult {
        let pool: Vec<usize> = dataset
            .disciplines()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.failed_student_count > 0)
            .map(|(index, _)| index)
            .collect();

        // Draw all picks first so the random sequence does not depend on evaluation order
        let selections: Vec<Vec<bool>> = (0..self.num_trials)
            .map(|_| {
                let mut shuffled = pool.clone();
                shuffled.shuffle(&mut *rng);

                let mut genes = vec![false; dataset.disciplines().len()];
                for &index in shuffled.iter().take(self.max_disciplines) {
                    genes[index] = true;
                }
                genes
            })
            .collect();

        let trials: Vec<Trial> = selections
            .into_par_iter()
            .enumerate()
            .map(|(index, genes)| Trial {
                trial: index + 1,
                selected_disciplines: dataset.selected_disciplines(&genes),
                evaluation: self.evaluator.evaluate(&genes, dataset),
            })
            .collect();

        let statistics = TrialStatistics {
            benefited_students: Aggregate::of(&column(&trials, |e| e.benefited_students as f64)),
            satisfied_slots: Aggregate::of(&column(&trials, |e| e.satisfied_slots as f64)),
            fitness: Aggregate::of(&column(&trials, |e| e.fitness)),
        };

        let mut best = 0;
        let mut worst = 0;
        for (index, trial) in trials.iter().enumerate() {
            if trial.evaluation.fitness > trials[best].evaluation.fitness {
                best = index;
            }
            if trial.evaluation.fitness < trials[worst].evaluation.fitness {
                worst = index;
            }
        }

        debug!(
            "Random baseline over {} trials: mean fitness {:.1}",
            trials.len(),
            statistics.fitness.mean
        );

        RandomSamplingResult {
            name: "Random selection".to_string(),
            description: format!(
                "Mean of {} random selections of {} disciplines",
                self.num_trials, self.max_disciplines
            ),
            statistics,
            best: trials[best].clone(),
            worst: trials[worst].clone(),
            trials,
        }
    }

    /// Runs both baselines and lines them up against a GA result.
    pub fn compare(
        &self,
        dataset: &Dataset,
        genetic: &GaReport,
        rng: &mut dyn RngCore,
    ) -> Comparison {
        let greedy = self.greedy(dataset);
        let random = self.random(dataset, rng);

        let total_students = dataset.students().len() as f64;
        let random_summary = Summary {
            students_helped: random.statistics.benefited_students.mean,
            coverage_percent: random.statistics.benefited_students.mean / total_students * 100.0,
            slots_attended: random.statistics.satisfied_slots.mean,
            fitness: random.statistics.fitness.mean,
        };

        Comparison {
            genetic: Summary::of(&genetic.best_evaluation),
            greedy: Summary::of(&greedy.evaluation),
            random: random_summary,
            detail: ComparisonDetail { greedy, random },
        }
    }
}

fn column(trials: &[Trial], metric: impl Fn(&Evaluation) -> f64) -> Vec<f64> {
    trials.iter().map(|t| metric(&t.evaluation)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Student;
    use rand::rngs::StdRng;

    fn dataset() -> Dataset {
        let disciplines = vec![
            Discipline::new("A", "A", 1),
            Discipline::new("B", "B", 2),
            Discipline::new("C", "C", 3),
            Discipline::new("D", "D", 4),
            Discipline::new("E", "E", 5),
        ];
        let students = vec![
            Student::new("1", "s1", ["A", "B"]),
            Student::new("2", "s2", ["A", "C"]),
            Student::new("3", "s3", ["A"]),
            Student::new("4", "s4", ["B", "D"]),
            Student::new("5", "s5", ["B"]),
        ];
        Dataset::new(disciplines, students).unwrap()
    }

    fn comparator(max_disciplines: usize) -> Comparator {
        Comparator::new(&ReofferConfig {
            max_disciplines,
            num_random_trials: 40,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn aggregate_uses_population_deviation() {
        let aggregate = Aggregate::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(aggregate.mean, 5.0);
        assert_eq!(aggregate.min, 2.0);
        assert_eq!(aggregate.max, 9.0);
        assert_eq!(aggregate.std_dev, 2.0);

        let single = Aggregate::of(&[3.0]);
        assert_eq!((single.min, single.max, single.std_dev), (3.0, 3.0, 0.0));
    }

    #[test]
    fn greedy_takes_the_most_failed_disciplines() {
        let dataset = dataset();
        let result = comparator(2).greedy(&dataset);

        let codes: Vec<&str> = result
            .selected_disciplines
            .iter()
            .map(|d| d.code.as_str())
            .collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(result.evaluation.benefited_students, 5);
        assert_eq!(result.evaluation.satisfied_slots, 6);
        assert_eq!(result.evaluation.fitness, 506.0);
    }

    #[test]
    fn random_trials_only_use_failed_disciplines() {
        let dataset = dataset();
        let mut rng = StdRng::seed_from_u64(21);
        let result = comparator(2).random(&dataset, &mut rng);

        assert_eq!(result.trials.len(), 40);
        for (index, trial) in result.trials.iter().enumerate() {
            assert_eq!(trial.trial, index + 1);
            assert_eq!(trial.selected_disciplines.len(), 2);
            assert!(trial.selected_disciplines.iter().all(|d| d.code != "E"));
        }

        let fitness = result.statistics.fitness;
        assert_eq!(result.best.evaluation.fitness, fitness.max);
        assert_eq!(result.worst.evaluation.fitness, fitness.min);
        assert!(fitness.min <= fitness.mean && fitness.mean <= fitness.max);
    }

    #[test]
    fn best_and_worst_keep_the_first_occurrence() {
        let dataset = dataset();
        let mut rng = StdRng::seed_from_u64(22);
        let result = comparator(2).random(&dataset, &mut rng);

        let first_best = result
            .trials
            .iter()
            .position(|t| t.evaluation.fitness == result.statistics.fitness.max)
            .unwrap();
        let first_worst = result
            .trials
            .iter()
            .position(|t| t.evaluation.fitness == result.statistics.fitness.min)
            .unwrap();

        assert_eq!(result.best.trial, first_best + 1);
        assert_eq!(result.worst.trial, first_worst + 1);
    }

    #[test]
    fn random_is_reproducible_for_a_seed() {
        let dataset = dataset();
        let comparator = comparator(2);

        let first = comparator.random(&dataset, &mut StdRng::seed_from_u64(5));
        let second = comparator.random(&dataset, &mut StdRng::seed_from_u64(5));

        assert_eq!(first.statistics, second.statistics);
        assert_eq!(first.best.trial, second.best.trial);
    }
}
