use thiserror::Error;

/// Errors surfaced by the scheduler core and its job file.
///
/// Every variant is a local, recoverable condition: callers get it back as a
/// value and decide what to do with it.
#[derive(Error, Debug)]
pub enum SpoolerError {
    /// Id-keyed lookup, update or removal on an id the scheduler does not track
    #[error("Job not found: {0}")]
    NotFound(String),

    /// Insert attempted while the scheduler holds its configured maximum
    #[error("Scheduler is full ({0} jobs)")]
    CapacityExceeded(usize),

    /// An id was registered twice
    #[error("Duplicate job id: {0}")]
    DuplicateId(String),

    /// No id sequence is left after the given job id
    #[error("Job id sequence exhausted after {0}")]
    SequenceExhausted(String),

    #[error("Printer not found: {0}")]
    PrinterNotFound(usize),

    /// Every printer is offline
    #[error("No printer is online")]
    NoPrinterOnline,

    /// A line of the job file could not be parsed
    #[error("Invalid job record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpoolerError>;
