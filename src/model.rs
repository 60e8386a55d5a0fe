//! Domain records consumed by the optimizer.
//!
//! A [`Dataset`] is built once per run from a discipline catalog and a student
//! roster. Construction derives the per-discipline failure counts, drops students
//! without failures, resolves every failed code to a discipline index and sorts
//! both lists into their canonical order. After that the dataset never changes.

use crate::error::{OptimizerError, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Capacity assumed for a student when the roster does not provide one.
pub const DEFAULT_CAPACITY: u32 = 5;

/// Number of curriculum positions that make up one semester.
const POSITIONS_PER_SEMESTER: u32 = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discipline {
    pub code: String,
    pub name: String,
    /// Ordinal in the curriculum grid, 0 when unknown.
    pub curriculum_position: u32,
    /// Students in the dataset who failed this discipline. Filled in by [`Dataset::new`].
    pub failed_student_count: usize,
}

impl Discipline {
    pub fn new(code: impl Into<String>, name: impl Into<String>, curriculum_position: u32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            curriculum_position,
            failed_student_count: 0,
        }
    }

    /// Semester the discipline belongs to, falling back to 1 for unknown positions.
    pub fn semester(&self) -> u32 {
        if self.curriculum_position == 0 {
            1
        } else {
            self.curriculum_position.div_ceil(POSITIONS_PER_SEMESTER)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub campus: String,
    pub failed_disciplines: Vec<String>,
    pub capacity_per_term: u32,
}

impl Student {
    /// Creates a student with the default campus and capacity.
    ///
    /// Repeated codes are dropped, keeping the first occurrence.
    pub fn new<I, S>(id: impl Into<String>, name: impl Into<String>, failed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let failed_disciplines = failed
            .into_iter()
            .map(Into::into)
            .filter(|code: &String| seen.insert(code.clone()))
            .collect();

        Self {
            id: id.into(),
            name: name.into(),
            campus: "unknown".to_string(),
            failed_disciplines,
            capacity_per_term: DEFAULT_CAPACITY,
        }
    }

    pub fn with_campus(mut self, campus: impl Into<String>) -> Self {
        self.campus = campus.into();
        self
    }

    pub fn with_capacity(mut self, capacity_per_term: u32) -> Self {
        self.capacity_per_term = capacity_per_term;
        self
    }

    pub fn total_failures(&self) -> usize {
        self.failed_disciplines.len()
    }
}

/// Decides how many re-offered disciplines a student can take in one term.
pub trait CapacityPolicy: Send + Sync {
    fn capacity(&self, student_id: &str, total_failures: usize) -> u32;
}

/// Gives every student the same capacity.
#[derive(Clone, Copy, Debug)]
pub struct FixedCapacity(pub u32);

impl Default for FixedCapacity {
    fn default() -> Self {
        FixedCapacity(DEFAULT_CAPACITY)
    }
}

impl CapacityPolicy for FixedCapacity {
    fn capacity(&self, _student_id: &str, _total_failures: usize) -> u32 {
        self.0
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    disciplines: Vec<Discipline>,
    students: Vec<Student>,
    #[serde(skip)]
    failed_indices: Vec<Vec<usize>>,
}

impl Dataset {
    pub fn new(mut disciplines: Vec<Discipline>, students: Vec<Student>) -> Result<Self> {
        if disciplines.is_empty() {
            return Err(OptimizerError::EmptyDisciplines);
        }

        let mut students: Vec<Student> = students
            .into_iter()
            .filter(|s| s.total_failures() > 0)
            .collect();

        if students.is_empty() {
            return Err(OptimizerError::EmptyStudents);
        }

        let mut positions: HashMap<String, usize> = HashMap::with_capacity(disciplines.len());
        for (index, discipline) in disciplines.iter().enumerate() {
            if positions.insert(discipline.code.clone(), index).is_some() {
                return Err(OptimizerError::DuplicateDiscipline(discipline.code.clone()));
            }
        }

        let mut counts = vec![0usize; disciplines.len()];
        for student in students.iter() {
            if student.capacity_per_term == 0 {
                return Err(OptimizerError::InvalidCapacity {
                    student: student.id.clone(),
                });
            }

            for code in student.failed_disciplines.iter() {
                match positions.get(code) {
                    Some(&index) => counts[index] += 1,
                    None => {
                        return Err(OptimizerError::UnknownDiscipline {
                            student: student.id.clone(),
                            code: code.clone(),
                        })
                    }
                }
            }
        }

        for (discipline, count) in disciplines.iter_mut().zip(counts) {
            discipline.failed_student_count = count;
        }

        // Stable sorts, so remaining ties keep the caller's order
        disciplines.sort_by(|a, b| {
            b.failed_student_count
                .cmp(&a.failed_student_count)
                .then_with(|| a.curriculum_position.cmp(&b.curriculum_position))
        });
        students.sort_by(|a, b| b.total_failures().cmp(&a.total_failures()));

        let index_of: HashMap<&str, usize> = disciplines
            .iter()
            .enumerate()
            .map(|(index, d)| (d.code.as_str(), index))
            .collect();

        let failed_indices = students
            .iter()
            .map(|s| {
                s.failed_disciplines
                    .iter()
                    .map(|code| index_of[code.as_str()])
                    .collect()
            })
            .collect();

        Ok(Self {
            disciplines,
            students,
            failed_indices,
        })
    }

    pub fn disciplines(&self) -> &[Discipline] {
        &self.disciplines
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Indices into [`Dataset::disciplines`] of the disciplines failed by student `student`.
    pub fn failed_indices(&self, student: usize) -> &[usize] {
        &self.failed_indices[student]
    }

    pub fn discipline_index(&self, code: &str) -> Option<usize> {
        self.disciplines.iter().position(|d| d.code == code)
    }

    /// Bit vector selecting the given discipline codes. Unknown codes are ignored.
    pub fn selection_of<'a, I>(&self, codes: I) -> Vec<bool>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut genes = vec![false; self.disciplines.len()];
        for code in codes {
            if let Some(index) = self.discipline_index(code) {
                genes[index] = true;
            }
        }
        genes
    }

    /// Disciplines switched on in `genes`, in dataset order.
    ///
    /// # Panics
    ///
    /// If `genes` does not have exactly one entry per discipline.
    pub fn selected_disciplines(&self, genes: &[bool]) -> Vec<Discipline> {
        self.check_selection(genes);
        genes
            .iter()
            .zip(self.disciplines.iter())
            .filter(|(&on, _)| on)
            .map(|(_, d)| d.clone())
            .collect()
    }

    pub(crate) fn check_selection(&self, genes: &[bool]) {
        assert_eq!(
            genes.len(),
            self.disciplines.len(),
            "selection has {} genes but the dataset has {} disciplines",
            genes.len(),
            self.disciplines.len()
        );
    }
}
