use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SpoolerError};
use crate::spooler::job::{Job, JobKind, JobStatus};

/// Persisted form of a job: `id,kind,priority,status,reason`
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: String,
    pub kind: JobKind,
    pub priority: i64,
    pub status: JobStatus,
}

impl JobRecord {
    /// Parse one line. `line_no` is 1-based and only used for error reporting.
    ///
    /// The first four commas split the fixed columns; everything after them
    /// is the reason, commas included.
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let invalid = |reason: String| SpoolerError::InvalidRecord {
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line.splitn(5, ',').collect();
        if fields.len() < 4 {
            return Err(invalid(format!(
                "expected at least 4 fields, found {}",
                fields.len()
            )));
        }

        let id = fields[0].trim();
        if id.is_empty() {
            return Err(invalid("empty job id".to_string()));
        }
        let kind = fields[1].parse::<JobKind>().map_err(invalid)?;
        let priority = fields[2]
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid(format!("bad priority '{}': {}", fields[2], e)))?;
        let reason = fields.get(4).copied().unwrap_or("");
        let status = JobStatus::from_record(fields[3], reason).map_err(invalid)?;

        Ok(Self {
            id: id.to_string(),
            kind,
            priority,
            status,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.id,
            self.kind.code(),
            self.priority,
            self.status.label(),
            self.status.reason()
        )
    }
}

impl From<&Job> for JobRecord {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            kind: job.kind,
            priority: job.priority as i64,
            status: job.status.clone(),
        }
    }
}

/// Read every record from the job file. A missing file is an empty set.
pub fn load(path: &Path) -> Result<Vec<JobRecord>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No job file at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let records = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| JobRecord::parse(line, i + 1))
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} jobs from {}", records.len(), path.display());
    Ok(records)
}

/// Overwrite the job file with `jobs`, one record per line, in the given order
pub fn save(path: &Path, jobs: &[Job]) -> Result<()> {
    let mut out = String::new();
    for job in jobs {
        out.push_str(&JobRecord::from(job).to_line());
        out.push('\n');
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, out)?;

    debug!("Saved {} jobs to {}", jobs.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queued_record() {
        let record = JobRecord::parse("PDF3,PDF,2,Queued,None", 1).unwrap();
        assert_eq!(record.id, "PDF3");
        assert_eq!(record.kind, JobKind::Pdf);
        assert_eq!(record.priority, 2);
        assert_eq!(record.status, JobStatus::Queued);
    }

    #[test]
    fn test_parse_reason_keeps_commas() {
        let record = JobRecord::parse("IMG9,IMG,1,Delayed,tray 2, out of paper", 1).unwrap();
        assert_eq!(record.status, JobStatus::delayed("tray 2, out of paper"));
        assert_eq!(record.to_line(), "IMG9,IMG,1,Delayed,tray 2, out of paper");
    }

    #[test]
    fn test_parse_without_reason_column() {
        let record = JobRecord::parse("TXT1,TXT,4,Queued", 1).unwrap();
        assert_eq!(record.status, JobStatus::Queued);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let cases = [
            "PDF1,PDF",
            "PDF1,FAX,2,Queued,None",
            "PDF1,PDF,high,Queued,None",
            "PDF1,PDF,2,Lost,None",
            ",PDF,2,Queued,None",
        ];
        for case in cases {
            match JobRecord::parse(case, 7) {
                Err(SpoolerError::InvalidRecord { line, .. }) => assert_eq!(line, 7),
                other => panic!("expected InvalidRecord for {:?}, got {:?}", case, other),
            }
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = load(&dir.path().join("absent.txt")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.txt");
        fs::write(&path, "PDF1,PDF,2,Queued,None\n\n   \nIMG2,IMG,1,Printing,None\n").unwrap();

        let records = load(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].status, JobStatus::Printing);
    }

    #[test]
    fn test_load_reports_bad_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.txt");
        fs::write(&path, "PDF1,PDF,2,Queued,None\n\nIMG2,IMG,x,Queued,None\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, SpoolerError::InvalidRecord { line: 3, .. }));
    }
}
