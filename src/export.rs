use crate::comparison::{Comparison, Summary};
use crate::error::Result;
use crate::genetic_optimizer::GenerationRecord;
use crate::model::Discipline;
use csv::Writer;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    strategy: &'a str,
    students_helped: f64,
    coverage_percent: f64,
    slots_attended: f64,
    fitness: f64,
}

impl<'a> SummaryRow<'a> {
    fn new(strategy: &'a str, summary: &Summary) -> Self {
        Self {
            strategy,
            students_helped: summary.students_helped,
            coverage_percent: summary.coverage_percent,
            slots_attended: summary.slots_attended,
            fitness: summary.fitness,
        }
    }
}

#[derive(Debug, Serialize)]
struct DisciplineRow<'a> {
    code: &'a str,
    name: &'a str,
    semester: u32,
    failed_students: usize,
}

pub fn write_history<W: Write>(history: &[GenerationRecord], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    for record in history {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_comparison<W: Write>(comparison: &Comparison, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    for row in [
        SummaryRow::new("genetic", &comparison.genetic),
        SummaryRow::new("greedy", &comparison.greedy),
        SummaryRow::new("random", &comparison.random),
    ] {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_disciplines<W: Write>(disciplines: &[Discipline], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    for discipline in disciplines {
        writer.serialize(DisciplineRow {
            code: &discipline.code,
            name: &discipline.name,
            semester: discipline.semester(),
            failed_students: discipline.failed_student_count,
        })?;
    }
    writer.flush()?;
    Ok(())
}
