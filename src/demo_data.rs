use crate::error::{OptimizerError, Result};
use crate::model::{Dataset, Discipline, Student};
use rand::prelude::*;
use rand_distr::{Distribution, Exp, Normal};

/// Size of a synthetic roster.
#[derive(Clone, Copy, Debug)]
pub struct DemoShape {
    pub disciplines: usize,
    pub students: usize,
    pub mean_failures: f64,
}

impl Default for DemoShape {
    fn default() -> Self {
        Self {
            disciplines: 40,
            students: 300,
            mean_failures: 4.0,
        }
    }
}

pub fn disciplines(count: usize) -> Vec<Discipline> {
    (1..=count)
        .map(|i| Discipline::new(format!("CCCD{:04}", i), format!("Discipline {}", i), i as u32))
        .collect()
}

// A few disciplines fail most students; difficulty is exponentially distributed
pub fn difficulties(count: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
    let distribution = Exp::new(1.0).map_err(|e| invalid("difficulty", e))?;
    Ok((0..count)
        .map(|_| distribution.sample(&mut *rng) + 0.05)
        .collect())
}

fn invalid(name: &'static str, error: impl std::fmt::Display) -> OptimizerError {
    OptimizerError::InvalidParameter {
        name,
        reason: error.to_string(),
    }
}

pub fn demo_dataset(shape: DemoShape, rng: &mut dyn RngCore) -> Result<Dataset> {
    let catalog = disciplines(shape.disciplines);
    let weights = difficulties(shape.disciplines, rng)?;
    let indices: Vec<usize> = (0..shape.disciplines).collect();

    let failures = Normal::new(shape.mean_failures, shape.mean_failures / 2.0)
        .map_err(|e| invalid("meanFailures", e))?;

    let mut students = Vec::with_capacity(shape.students);
    for s in 0..shape.students {
        let count = failures
            .sample(&mut *rng)
            .round()
            .clamp(1.0, shape.disciplines.max(1) as f64) as usize;

        let failed: Vec<String> = indices
            .choose_multiple_weighted(&mut *rng, count, |&i| weights[i])
            .map_err(|e| invalid("difficulty", e))?
            .map(|&i| catalog[i].code.clone())
            .collect();

        let student = Student::new(
            format!("{}{:04}", 2017 + s % 6, s),
            format!("Student {}", s + 1),
            failed,
        )
        .with_campus(["North", "South", "East"][s % 3])
        .with_capacity(rng.gen_range(2..=6));

        students.push(student);
    }

    Dataset::new(catalog, students)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn demo_dataset_has_the_requested_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let shape = DemoShape {
            disciplines: 12,
            students: 50,
            mean_failures: 3.0,
        };

        let dataset = demo_dataset(shape, &mut rng).unwrap();

        assert_eq!(dataset.disciplines().len(), 12);
        assert_eq!(dataset.students().len(), 50);
        for student in dataset.students() {
            assert!(student.total_failures() >= 1);
            assert!((2..=6).contains(&student.capacity_per_term));
        }
        for pair in dataset.disciplines().windows(2) {
            assert!(pair[0].failed_student_count >= pair[1].failed_student_count);
        }
    }

    #[test]
    fn demo_dataset_is_reproducible() {
        let shape = DemoShape::default();
        let first = demo_dataset(shape, &mut StdRng::seed_from_u64(2)).unwrap();
        let second = demo_dataset(shape, &mut StdRng::seed_from_u64(2)).unwrap();

        assert_eq!(first.students(), second.students());
        assert_eq!(first.disciplines(), second.disciplines());
    }
}
