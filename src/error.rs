use thiserror::Error;

/// Errors raised while building a dataset, configuring a run or writing output.
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("invalid dataset: no disciplines were provided")]
    EmptyDisciplines,

    #[error("invalid dataset: no students with failed disciplines were provided")]
    EmptyStudents,

    #[error("invalid dataset: discipline code {0} appears more than once")]
    DuplicateDiscipline(String),

    #[error("invalid dataset: student {student} references unknown discipline {code}")]
    UnknownDiscipline { student: String, code: String },

    #[error("invalid dataset: student {student} has a capacity of zero")]
    InvalidCapacity { student: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chart error: {0}")]
    Chart(String),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
