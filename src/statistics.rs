//! Derived summaries of an optimization result and of the input dataset.

use crate::fitness::Evaluation;
use crate::model::{Dataset, Discipline, Student};
use serde::Serialize;
use std::collections::BTreeMap;

/// Upper bounds (inclusive) of the failure-count brackets. Students above the
/// last bound fall into the open `20+` bracket.
const BRACKETS: [(usize, &str); 4] = [(5, "1-5"), (10, "6-10"), (15, "11-15"), (20, "16-20")];
const OPEN_BRACKET: &str = "20+";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBracket {
    pub label: &'static str,
    pub total: usize,
    pub benefited: usize,
}

/// Ratios describing how well a selection spreads its benefit.
///
/// A ratio whose denominator is zero is reported as `0.0`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Efficiency {
    pub benefited_percent: f64,
    pub slots_per_benefited_student: f64,
    pub students_per_discipline: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub total_students: usize,
    pub benefited_students: usize,
    pub reoffered_disciplines: usize,
    pub satisfied_slots: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Re-offered disciplines per curriculum semester.
    pub disciplines_per_semester: BTreeMap<u32, usize>,
    pub failure_brackets: Vec<FailureBracket>,
    pub efficiency: Efficiency,
    pub summary: ResultSummary,
}

impl Statistics {
    pub fn from_evaluation(evaluation: &Evaluation, dataset: &Dataset) -> Self {
        let mut disciplines_per_semester = BTreeMap::new();
        for code in evaluation.selected_codes.iter() {
            if let Some(index) = dataset.discipline_index(code) {
                let semester = dataset.disciplines()[index].semester();
                *disciplines_per_semester.entry(semester).or_insert(0) += 1;
            }
        }

        let mut failure_brackets: Vec<FailureBracket> = BRACKETS
            .iter()
            .map(|&(_, label)| label)
            .chain(std::iter::once(OPEN_BRACKET))
            .map(|label| FailureBracket {
                label,
                total: 0,
                benefited: 0,
            })
            .collect();

        for outcome in evaluation.per_student.iter() {
            let bracket = &mut failure_brackets[bracket_index(outcome.total_failures)];
            bracket.total += 1;
            if outcome.matched > 0 {
                bracket.benefited += 1;
            }
        }

        let total_students = dataset.students().len();
        let efficiency = Efficiency {
            benefited_percent: ratio(evaluation.benefited_students, total_students) * 100.0,
            slots_per_benefited_student: ratio(
                evaluation.satisfied_slots,
                evaluation.benefited_students,
            ),
            students_per_discipline: ratio(
                evaluation.benefited_students,
                evaluation.selected_count,
            ),
        };

        Self {
            disciplines_per_semester,
            failure_brackets,
            efficiency,
            summary: ResultSummary {
                total_students,
                benefited_students: evaluation.benefited_students,
                reoffered_disciplines: evaluation.selected_count,
                satisfied_slots: evaluation.satisfied_slots,
            },
        }
    }
}

fn bracket_index(total_failures: usize) -> usize {
    BRACKETS
        .iter()
        .position(|&(upper, _)| total_failures <= upper)
        .unwrap_or(BRACKETS.len())
}

pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Headline figures about a dataset before any optimization.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetOverview {
    pub total_disciplines: usize,
    pub total_students: usize,
    pub disciplines_with_failures: usize,
    pub mean_failures_per_student: f64,
    pub most_failed_discipline: Discipline,
    pub student_with_most_failures: Student,
}

impl DatasetOverview {
    pub fn of(dataset: &Dataset) -> Self {
        let students = dataset.students();
        let total_failures: usize = students.iter().map(Student::total_failures).sum();

        // Both lists are already sorted by failures, the first entry is the maximum
        Self {
            total_disciplines: dataset.disciplines().len(),
            total_students: students.len(),
            disciplines_with_failures: dataset
                .disciplines()
                .iter()
                .filter(|d| d.failed_student_count > 0)
                .count(),
            mean_failures_per_student: ratio(total_failures, students.len()),
            most_failed_discipline: dataset.disciplines()[0].clone(),
            student_with_most_failures: students[0].clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::FitnessEvaluator;

    fn dataset() -> Dataset {
        let disciplines = vec![
            Discipline::new("D1", "Intro", 1),
            Discipline::new("D6", "Structures", 6),
            Discipline::new("D7", "Networks", 7),
            Discipline::new("D30", "Thesis", 30),
        ];

        let heavy: Vec<String> = ["D1", "D6", "D7", "D30"].iter().map(|s| s.to_string()).collect();
        let students = vec![
            Student::new("1", "Ana", ["D1"]),
            Student::new("2", "Bia", ["D6", "D7"]),
            Student::new("3", "Caio", heavy),
            Student::new("4", "Davi", ["D30"]),
        ];
        Dataset::new(disciplines, students).unwrap()
    }

    #[test]
    fn brackets_cover_every_failure_count() {
        assert_eq!(bracket_index(1), 0);
        assert_eq!(bracket_index(5), 0);
        assert_eq!(bracket_index(6), 1);
        assert_eq!(bracket_index(15), 2);
        assert_eq!(bracket_index(20), 3);
        assert_eq!(bracket_index(21), 4);
    }

    #[test]
    fn statistics_of_a_selection() {
        let dataset = dataset();
        let genes = dataset.selection_of(["D6", "D7"]);
        let evaluation = FitnessEvaluator::default().evaluate(&genes, &dataset);

        let stats = Statistics::from_evaluation(&evaluation, &dataset);

        assert_eq!(stats.disciplines_per_semester.get(&2), Some(&2));
        assert_eq!(stats.disciplines_per_semester.len(), 1);

        let labels: Vec<&str> = stats.failure_brackets.iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["1-5", "6-10", "11-15", "16-20", "20+"]);
        assert_eq!(stats.failure_brackets[0].total, 4);
        assert_eq!(stats.failure_brackets[0].benefited, 2);

        assert_eq!(stats.summary.benefited_students, 2);
        assert_eq!(stats.summary.satisfied_slots, 4);
        assert_eq!(stats.efficiency.benefited_percent, 50.0);
        assert_eq!(stats.efficiency.slots_per_benefited_student, 2.0);
        assert_eq!(stats.efficiency.students_per_discipline, 1.0);
    }

    #[test]
    fn empty_selection_reports_zero_ratios() {
        let dataset = dataset();
        let genes = vec![false; dataset.disciplines().len()];
        let evaluation = FitnessEvaluator::default().evaluate(&genes, &dataset);

        let stats = Statistics::from_evaluation(&evaluation, &dataset);
        assert!(stats.disciplines_per_semester.is_empty());
        assert_eq!(stats.efficiency.benefited_percent, 0.0);
        assert_eq!(stats.efficiency.slots_per_benefited_student, 0.0);
        assert_eq!(stats.efficiency.students_per_discipline, 0.0);
    }

    #[test]
    fn overview_reports_the_extremes() {
        let overview = DatasetOverview::of(&dataset());

        assert_eq!(overview.total_disciplines, 4);
        assert_eq!(overview.total_students, 4);
        assert_eq!(overview.disciplines_with_failures, 4);
        assert_eq!(overview.mean_failures_per_student, 2.0);
        assert_eq!(overview.student_with_most_failures.id, "3");
        assert!(overview.most_failed_discipline.failed_student_count >= 2);
    }
}
