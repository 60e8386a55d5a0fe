//! Reads a failures sheet exported as CSV.
//!
//! The sheet has one row per student. Identification columns are found by
//! header name; every header containing the discipline marker (e.g.
//! `CCCD0012 - Databases`) is a discipline column, and a cell marked `X`, `x`
//! or `1` in it records a failure.

use crate::error::Result;
use crate::model::{CapacityPolicy, Dataset, Discipline, FixedCapacity, Student};
use csv::{ReaderBuilder, StringRecord};
use log::warn;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct SheetLayout {
    pub id_columns: Vec<String>,
    pub name_columns: Vec<String>,
    pub campus_columns: Vec<String>,
    pub capacity_columns: Vec<String>,
    /// Prefix that identifies discipline columns and starts discipline codes.
    pub discipline_marker: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            id_columns: owned(&["Matrícula", "Matricula", "MATRICULA", "MATRÍCULA"]),
            name_columns: owned(&["Nome", "NOME", "nome", "Discente"]),
            campus_columns: owned(&["Polo", "POLO", "polo"]),
            capacity_columns: owned(&["Capacidade", "Capacity"]),
            discipline_marker: "CCCD".to_string(),
        }
    }
}

#[derive(Debug)]
struct DisciplineColumn {
    index: usize,
    code: String,
    name: String,
    position: u32,
}

#[derive(Debug)]
struct Columns {
    id: Option<usize>,
    name: Option<usize>,
    campus: Option<usize>,
    capacity: Option<usize>,
    disciplines: Vec<DisciplineColumn>,
}

pub struct SheetLoader<P: CapacityPolicy = FixedCapacity> {
    pub layout: SheetLayout,
    pub policy: P,
}

impl Default for SheetLoader<FixedCapacity> {
    fn default() -> Self {
        Self {
            layout: SheetLayout::default(),
            policy: FixedCapacity::default(),
        }
    }
}

impl<P: CapacityPolicy> SheetLoader<P> {
    pub fn new(layout: SheetLayout, policy: P) -> Self {
        Self { layout, policy }
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let file = std::fs::File::open(path)?;
        self.load(file)
    }

    /// Builds a dataset from CSV data. Only disciplines failed by at least one
    /// student enter the catalog.
    pub fn load<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = self.columns(reader.headers()?);

        let mut students = Vec::new();
        let mut failed_codes: HashSet<String> = HashSet::new();

        for (line, record) in reader.records().enumerate() {
            let record = record?;

            let id = cell(&record, columns.id);
            let name = cell(&record, columns.name);
            let (Some(id), Some(name)) = (id, name) else {
                warn!("Row {}: missing student id or name, skipping", line + 2);
                continue;
            };

            let failed: Vec<String> = columns
                .disciplines
                .iter()
                .filter(|c| is_failure(record.get(c.index).unwrap_or("")))
                .map(|c| c.code.clone())
                .collect();

            if failed.is_empty() {
                continue;
            }

            let capacity = cell(&record, columns.capacity)
                .and_then(|c| c.parse::<u32>().ok())
                .filter(|&c| c > 0)
                .unwrap_or_else(|| self.policy.capacity(id, failed.len()));

            failed_codes.extend(failed.iter().cloned());

            let mut student = Student::new(id, name, failed).with_capacity(capacity);
            if let Some(campus) = cell(&record, columns.campus) {
                student = student.with_campus(campus);
            }
            students.push(student);
        }

        let mut seen = HashSet::new();
        let disciplines = columns
            .disciplines
            .into_iter()
            .filter(|c| failed_codes.contains(&c.code) && seen.insert(c.code.clone()))
            .map(|c| Discipline::new(c.code, c.name, c.position))
            .collect();

        Dataset::new(disciplines, students)
    }

    fn columns(&self, headers: &StringRecord) -> Columns {
        let find = |candidates: &[String]| {
            headers
                .iter()
                .position(|h| candidates.iter().any(|c| c == h.trim()))
        };

        let marker = self.layout.discipline_marker.as_str();
        let disciplines = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains(marker))
            .map(|(index, header)| {
                let (code, position) = parse_code(header, marker);
                let name = match header.split_once(" - ") {
                    Some((_, name)) => name.trim().to_string(),
                    None => header.to_string(),
                };
                DisciplineColumn {
                    index,
                    code,
                    name,
                    position,
                }
            })
            .collect();

        Columns {
            id: find(self.layout.id_columns.as_slice()),
            name: find(self.layout.name_columns.as_slice()),
            campus: find(self.layout.campus_columns.as_slice()),
            capacity: find(self.layout.capacity_columns.as_slice()),
            disciplines,
        }
    }
}

fn cell(record: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|index| record.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn is_failure(value: &str) -> bool {
    matches!(value.trim(), "X" | "x" | "1")
}

/// Splits `CCCD0012 - Databases` into the code `CCCD0012` and position 12. A
/// header without digits after the marker is its own code, at position 0.
fn parse_code(header: &str, marker: &str) -> (String, u32) {
    let Some(start) = header.find(marker) else {
        return (header.to_string(), 0);
    };

    let digits: String = header[start + marker.len()..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();

    if digits.is_empty() {
        (header.to_string(), 0)
    } else {
        let position = digits.parse().unwrap_or(0);
        (format!("{}{}", marker, digits), position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OptimizerError;

    const SHEET: &str = "\
Matrícula,Nome,Polo,CCCD0001 - Calculus I,CCCD0007 - Calculus II,CCCD0012 - Databases,Observação
2017001,Ana,North,X,,x,
2017002,Bia,,,1,X,late
2017003,Caio,South,,,,
,Nobody,South,X,X,X,
2017004,Davi,North,,,X,
";

    #[test]
    fn parses_codes_and_positions() {
        assert_eq!(parse_code("CCCD0012 - Databases", "CCCD"), ("CCCD0012".to_string(), 12));
        assert_eq!(parse_code("Old CCCD - Misc", "CCCD"), ("Old CCCD - Misc".to_string(), 0));
    }

    #[test]
    fn failure_marks() {
        assert!(is_failure("X"));
        assert!(is_failure(" x "));
        assert!(is_failure("1"));
        assert!(!is_failure(""));
        assert!(!is_failure("0"));
        assert!(!is_failure("OK"));
    }

    #[test]
    fn loads_students_and_disciplines() {
        let dataset = SheetLoader::default().load(SHEET.as_bytes()).unwrap();

        let ids: Vec<&str> = dataset.students().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2017001", "2017002", "2017004"]);

        let ana = &dataset.students()[0];
        assert_eq!(ana.failed_disciplines, vec!["CCCD0001", "CCCD0012"]);
        assert_eq!(ana.campus, "North");
        assert_eq!(ana.capacity_per_term, 5);
        assert_eq!(dataset.students()[1].campus, "unknown");

        let top = &dataset.disciplines()[0];
        assert_eq!(top.code, "CCCD0012");
        assert_eq!(top.name, "Databases");
        assert_eq!(top.curriculum_position, 12);
        assert_eq!(top.failed_student_count, 3);
        assert_eq!(dataset.disciplines().len(), 3);
    }

    #[test]
    fn capacity_column_overrides_policy() {
        let sheet = "\
Matricula,Nome,Capacity,CCCD0001 - Calculus I,CCCD0002 - Physics
1,Ana,2,X,X
2,Bia,,X,
3,Caio,0,,X
";
        let loader = SheetLoader::new(SheetLayout::default(), FixedCapacity(4));
        let dataset = loader.load(sheet.as_bytes()).unwrap();

        let capacity = |id: &str| {
            dataset
                .students()
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.capacity_per_term)
        };
        assert_eq!(capacity("1"), Some(2));
        assert_eq!(capacity("2"), Some(4));
        assert_eq!(capacity("3"), Some(4));
    }

    #[test]
    fn sheet_without_failures_is_rejected() {
        let sheet = "Matricula,Nome,CCCD0001 - Calculus I\n1,Ana,\n";
        assert!(matches!(
            SheetLoader::default().load(sheet.as_bytes()),
            Err(OptimizerError::EmptyDisciplines)
        ));
    }
}
