//! Scoring of a discipline selection.
//!
//! The GA and both baselines score selections through [`FitnessEvaluator`], so
//! their results are directly comparable.

use crate::genetic_optimizer::ReofferConfig;
use crate::model::Dataset;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessEvaluator {
    pub weight_students: f64,
    pub weight_slots: f64,
    pub penalty_rate: f64,
    pub max_allowed: usize,
}

impl Default for FitnessEvaluator {
    fn default() -> Self {
        Self::from_config(&ReofferConfig::default())
    }
}

/// How a single student fares under a selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOutcome {
    pub student_id: String,
    pub name: String,
    pub total_failures: usize,
    /// Failed disciplines present in the selection.
    pub matched: usize,
    /// `matched` clamped to the student's capacity.
    pub satisfied: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub fitness: f64,
    pub benefited_students: usize,
    pub satisfied_slots: usize,
    pub selected_count: usize,
    pub selected_codes: Vec<String>,
    pub per_student: Vec<StudentOutcome>,
}

impl Evaluation {
    /// Share of the roster with at least one satisfied discipline, in percent.
    pub fn coverage_percent(&self) -> f64 {
        if self.per_student.is_empty() {
            0.0
        } else {
            self.benefited_students as f64 / self.per_student.len() as f64 * 100.0
        }
    }
}

impl FitnessEvaluator {
    pub fn from_config(config: &ReofferConfig) -> Self {
        Self {
            weight_students: config.weight_students,
            weight_slots: config.weight_slots,
            penalty_rate: config.penalty_rate,
            max_allowed: config.max_disciplines,
        }
    }

    /// Scores `genes` against `dataset`.
    ///
    /// # Panics
    ///
    /// If `genes` does not have exactly one entry per discipline of the dataset.
    pub fn evaluate(&self, genes: &[bool], dataset: &Dataset) -> Evaluation {
        dataset.check_selection(genes);

        let selected_codes: Vec<String> = genes
            .iter()
            .zip(dataset.disciplines())
            .filter(|(&on, _)| on)
            .map(|(_, d)| d.code.clone())
            .collect();

        let mut benefited_students = 0;
        let mut satisfied_slots = 0;
        let mut per_student = Vec::with_capacity(dataset.students().len());

        for (index, student) in dataset.students().iter().enumerate() {
            let matched = dataset
                .failed_indices(index)
                .iter()
                .filter(|&&d| genes[d])
                .count();
            let satisfied = matched.min(student.capacity_per_term as usize);

            if satisfied > 0 {
                benefited_students += 1;
                satisfied_slots += satisfied;
            }

            per_student.push(StudentOutcome {
                student_id: student.id.clone(),
                name: student.name.clone(),
                total_failures: student.total_failures(),
                matched,
                satisfied,
            });
        }

        let selected_count = selected_codes.len();
        let fitness = self.score(benefited_students, satisfied_slots, selected_count);

        Evaluation {
            fitness,
            benefited_students,
            satisfied_slots,
            selected_count,
            selected_codes,
            per_student,
        }
    }

    /// Weighted benefit minus the penalty for exceeding the cap.
    pub fn score(&self, benefited_students: usize, satisfied_slots: usize, selected: usize) -> f64 {
        let excess = selected.saturating_sub(self.max_allowed);
        let penalty = excess as f64 * self.penalty_rate;

        benefited_students as f64 * self.weight_students
            + satisfied_slots as f64 * self.weight_slots
            - penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Discipline, Student};

    fn dataset() -> Dataset {
        let disciplines = vec![
            Discipline::new("A", "Algorithms", 1),
            Discipline::new("B", "Biology", 2),
            Discipline::new("C", "Chemistry", 3),
        ];
        let students = vec![
            Student::new("1", "Ana", ["A", "B", "C"]).with_capacity(2),
            Student::new("2", "Bia", ["A"]),
            Student::new("3", "Caio", ["C"]),
        ];
        Dataset::new(disciplines, students).unwrap()
    }

    fn evaluator(max_allowed: usize) -> FitnessEvaluator {
        FitnessEvaluator {
            weight_students: 100.0,
            weight_slots: 1.0,
            penalty_rate: 1000.0,
            max_allowed,
        }
    }

    #[test]
    fn empty_selection_scores_zero() {
        let dataset = dataset();
        let evaluation = evaluator(2).evaluate(&[false, false, false], &dataset);

        assert_eq!(evaluation.fitness, 0.0);
        assert_eq!(evaluation.benefited_students, 0);
        assert_eq!(evaluation.satisfied_slots, 0);
        assert!(evaluation.selected_codes.is_empty());
        assert_eq!(evaluation.per_student.len(), 3);
        assert_eq!(evaluation.coverage_percent(), 0.0);
    }

    #[test]
    fn capacity_clamps_satisfied_slots() {
        let dataset = dataset();
        let genes = dataset.selection_of(["A", "B", "C"]);
        let evaluation = evaluator(3).evaluate(&genes, &dataset);

        let ana = evaluation
            .per_student
            .iter()
            .find(|o| o.student_id == "1")
            .unwrap();
        assert_eq!(ana.matched, 3);
        assert_eq!(ana.satisfied, 2);

        assert_eq!(evaluation.benefited_students, 3);
        assert_eq!(evaluation.satisfied_slots, 4);
        assert_eq!(evaluation.fitness, 304.0);
        assert_eq!(evaluation.coverage_percent(), 100.0);
    }

    #[test]
    fn excess_selection_is_penalized() {
        let dataset = dataset();
        let genes = dataset.selection_of(["A", "B", "C"]);

        let within = evaluator(3).evaluate(&genes, &dataset);
        let over = evaluator(1).evaluate(&genes, &dataset);

        assert_eq!(within.fitness - over.fitness, 2000.0);
        assert_eq!(over.benefited_students, within.benefited_students);
        assert!(over.fitness < 0.0);
    }

    #[test]
    fn selected_codes_follow_dataset_order() {
        let dataset = dataset();
        let genes = dataset.selection_of(["C", "A"]);
        let evaluation = evaluator(2).evaluate(&genes, &dataset);

        let expected: Vec<String> = dataset
            .disciplines()
            .iter()
            .filter(|d| d.code == "A" || d.code == "C")
            .map(|d| d.code.clone())
            .collect();
        assert_eq!(evaluation.selected_codes, expected);
        assert_eq!(evaluation.selected_count, 2);
    }

    #[test]
    #[should_panic(expected = "selection has 1 genes but the dataset has 3 disciplines")]
    fn short_selection_is_rejected() {
        FitnessEvaluator::default().evaluate(&[true], &dataset());
    }

    #[test]
    #[should_panic(expected = "selection has 4 genes but the dataset has 3 disciplines")]
    fn long_selection_is_rejected() {
        FitnessEvaluator::default().evaluate(&[false; 4], &dataset());
    }
}
