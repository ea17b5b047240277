use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Most urgent priority class
pub const MIN_PRIORITY: u8 = 1;
/// Least urgent priority class, also where out-of-range input lands
pub const MAX_PRIORITY: u8 = 5;

/// Clamp raw priority input into `MIN_PRIORITY..=MAX_PRIORITY`.
///
/// Anything outside the range is stored as `MAX_PRIORITY` rather than rejected.
pub fn clamp_priority(raw: i64) -> u8 {
    if (MIN_PRIORITY as i64..=MAX_PRIORITY as i64).contains(&raw) {
        raw as u8
    } else {
        warn!("Priority {} out of range, clamped to {}", raw, MAX_PRIORITY);
        MAX_PRIORITY
    }
}

/// Document category, fixed at creation
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Pdf,
    Image,
    Text,
    Other,
}

impl JobKind {
    /// Three-letter code used as the id prefix and in the job file
    pub fn code(&self) -> &'static str {
        match self {
            JobKind::Pdf => "PDF",
            JobKind::Image => "IMG",
            JobKind::Text => "TXT",
            JobKind::Other => "DOC",
        }
    }

    /// Display icon for listings
    pub fn icon(&self) -> &'static str {
        match self {
            JobKind::Pdf => "[PDF]",
            JobKind::Image => "[IMG]",
            JobKind::Text => "[TXT]",
            JobKind::Other => "[DOC]",
        }
    }

    /// Randomized duration estimate in work units
    pub fn estimate_duration<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match self {
            JobKind::Pdf => rng.gen_range(5..=14),
            JobKind::Image => rng.gen_range(8..=22),
            JobKind::Text | JobKind::Other => rng.gen_range(2..=6),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(JobKind::Pdf),
            "img" | "image" => Ok(JobKind::Image),
            "txt" | "text" => Ok(JobKind::Text),
            "doc" | "other" => Ok(JobKind::Other),
            other => Err(format!("unknown job kind '{}'", other)),
        }
    }
}

/// Lifecycle state of a job
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Delayed { reason: String },
    Printing,
    Done,
}

impl JobStatus {
    /// Delayed status with the reason flattened onto a single line
    pub fn delayed(reason: impl AsRef<str>) -> Self {
        JobStatus::Delayed {
            reason: sanitize_reason(reason.as_ref()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Delayed { .. } => "Delayed",
            JobStatus::Printing => "Printing",
            JobStatus::Done => "Done",
        }
    }

    /// Reason column as written to the job file
    pub fn reason(&self) -> &str {
        match self {
            JobStatus::Delayed { reason } => reason,
            _ => "None",
        }
    }

    /// Rebuild a status from its job file columns
    pub fn from_record(label: &str, reason: &str) -> Result<Self, String> {
        match label.trim() {
            "Queued" => Ok(JobStatus::Queued),
            "Delayed" => Ok(JobStatus::delayed(reason)),
            "Printing" => Ok(JobStatus::Printing),
            "Done" => Ok(JobStatus::Done),
            other => Err(format!("unknown status '{}'", other)),
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, JobStatus::Queued)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Delayed { reason } => write!(f, "Delayed ({})", reason),
            other => f.write_str(other.label()),
        }
    }
}

/// Keep a reason on one line and free of the record delimiter's line breaks
fn sanitize_reason(reason: &str) -> String {
    reason.replace(['\r', '\n'], " ").trim().to_string()
}

/// One unit of print work tracked by the scheduler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub priority: u8,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printer: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Fresh queued job. Only the scheduler builds jobs, so the id is trusted.
    pub(crate) fn new(id: String, kind: JobKind, priority: u8, status: JobStatus) -> Self {
        Self {
            id,
            kind,
            priority,
            status,
            created_at: Utc::now(),
            estimated_duration: kind.estimate_duration(&mut rand::thread_rng()),
            printer: None,
            completed_at: None,
        }
    }
}

/// Build an id from a kind prefix and a sequence number
pub fn format_job_id(kind: JobKind, seq: u64) -> String {
    format!("{}{}", kind.code(), seq)
}

/// Numeric suffix of an id, formed from all of its digits
pub fn id_sequence(id: &str) -> Option<u64> {
    let digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_clamp_priority() {
        assert_eq!(clamp_priority(1), 1);
        assert_eq!(clamp_priority(3), 3);
        assert_eq!(clamp_priority(5), 5);
        assert_eq!(clamp_priority(0), MAX_PRIORITY);
        assert_eq!(clamp_priority(6), MAX_PRIORITY);
        assert_eq!(clamp_priority(-3), MAX_PRIORITY);
    }

    #[test]
    fn test_kind_parsing_accepts_codes_and_names() {
        assert_eq!("PDF".parse::<JobKind>().unwrap(), JobKind::Pdf);
        assert_eq!("image".parse::<JobKind>().unwrap(), JobKind::Image);
        assert_eq!("txt".parse::<JobKind>().unwrap(), JobKind::Text);
        assert_eq!("DOC".parse::<JobKind>().unwrap(), JobKind::Other);
        assert!("fax".parse::<JobKind>().is_err());
    }

    #[test]
    fn test_duration_estimates_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!((5..=14).contains(&JobKind::Pdf.estimate_duration(&mut rng)));
            assert!((8..=22).contains(&JobKind::Image.estimate_duration(&mut rng)));
            assert!((2..=6).contains(&JobKind::Text.estimate_duration(&mut rng)));
        }
    }

    #[test]
    fn test_status_record_columns() {
        let delayed = JobStatus::delayed("out of\npaper");
        assert_eq!(delayed.label(), "Delayed");
        assert_eq!(delayed.reason(), "out of paper");
        assert_eq!(JobStatus::Queued.reason(), "None");

        let parsed = JobStatus::from_record("Delayed", "toner low").unwrap();
        assert_eq!(parsed, JobStatus::delayed("toner low"));
        assert!(JobStatus::from_record("Lost", "").is_err());
    }

    #[test]
    fn test_id_sequence() {
        assert_eq!(format_job_id(JobKind::Image, 12), "IMG12");
        assert_eq!(id_sequence("IMG12"), Some(12));
        assert_eq!(id_sequence("PDF7"), Some(7));
        assert_eq!(id_sequence("nodigits"), None);
    }
}
