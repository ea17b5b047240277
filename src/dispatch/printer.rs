use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::error::{Result, SpoolerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterStatus {
    Online,
    Offline,
}

impl PrinterStatus {
    fn toggled(self) -> Self {
        match self {
            PrinterStatus::Online => PrinterStatus::Offline,
            PrinterStatus::Offline => PrinterStatus::Online,
        }
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterStatus::Online => write!(f, "Online"),
            PrinterStatus::Offline => write!(f, "Offline"),
        }
    }
}

/// A simulated printer and its running job count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Printer {
    pub id: usize,
    pub name: String,
    pub status: PrinterStatus,
    pub jobs_processed: u64,
}

/// The fixed set of printers a dispatcher can hand jobs to.
///
/// Ids run from 1 to the roster size. Only online printers receive work.
#[derive(Debug)]
pub struct Roster {
    printers: Vec<Printer>,
}

impl Roster {
    /// `count` printers, all online, named "Printer 1", "Printer 2", ...
    pub fn new(count: usize) -> Self {
        let printers = (1..=count)
            .map(|id| Printer {
                id,
                name: format!("Printer {}", id),
                status: PrinterStatus::Online,
                jobs_processed: 0,
            })
            .collect();
        Self { printers }
    }

    pub fn list(&self) -> Vec<Printer> {
        self.printers.clone()
    }

    /// Ids of online printers in roster order
    pub fn online_ids(&self) -> Vec<usize> {
        self.printers
            .iter()
            .filter(|p| p.status == PrinterStatus::Online)
            .map(|p| p.id)
            .collect()
    }

    pub fn first_online(&self) -> Option<usize> {
        self.printers
            .iter()
            .find(|p| p.status == PrinterStatus::Online)
            .map(|p| p.id)
    }

    /// Flip a printer between online and offline
    pub fn toggle(&mut self, id: usize) -> Result<Printer> {
        let printer = self.get_mut(id)?;
        printer.status = printer.status.toggled();
        info!("Printer {} is now {}", id, printer.status);
        Ok(printer.clone())
    }

    pub fn record_completion(&mut self, id: usize) -> Result<()> {
        let printer = self.get_mut(id)?;
        printer.jobs_processed = printer.jobs_processed.saturating_add(1);
        Ok(())
    }

    fn get_mut(&mut self, id: usize) -> Result<&mut Printer> {
        self.printers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SpoolerError::PrinterNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_roster_is_online() {
        let roster = Roster::new(3);
        assert_eq!(roster.list().len(), 3);
        assert_eq!(roster.online_ids(), vec![1, 2, 3]);
        assert_eq!(roster.list()[1].name, "Printer 2");
        assert!(roster.list().iter().all(|p| p.jobs_processed == 0));
    }

    #[test]
    fn test_toggle_flips_status() {
        let mut roster = Roster::new(3);

        let printer = roster.toggle(2).unwrap();
        assert_eq!(printer.status, PrinterStatus::Offline);
        assert_eq!(roster.online_ids(), vec![1, 3]);

        roster.toggle(1).unwrap();
        assert_eq!(roster.first_online(), Some(3));
        roster.toggle(3).unwrap();
        assert_eq!(roster.first_online(), None);
        roster.toggle(1).unwrap();

        let printer = roster.toggle(2).unwrap();
        assert_eq!(printer.status, PrinterStatus::Online);
        assert_eq!(roster.online_ids(), vec![1, 2]);
    }

    #[test]
    fn test_unknown_printer() {
        let mut roster = Roster::new(2);
        assert!(matches!(roster.toggle(0), Err(SpoolerError::PrinterNotFound(0))));
        assert!(matches!(
            roster.record_completion(7),
            Err(SpoolerError::PrinterNotFound(7))
        ));
        assert_eq!(roster.online_ids(), vec![1, 2]);
    }

    #[test]
    fn test_record_completion_counts_per_printer() {
        let mut roster = Roster::new(2);
        roster.record_completion(1).unwrap();
        roster.record_completion(1).unwrap();
        roster.record_completion(2).unwrap();

        let counts: Vec<u64> = roster.list().iter().map(|p| p.jobs_processed).collect();
        assert_eq!(counts, vec![2, 1]);
    }
}
