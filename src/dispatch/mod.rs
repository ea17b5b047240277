pub mod dispatcher;
pub mod history;
pub mod printer;
pub mod worker;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use history::History;
pub use printer::{Printer, PrinterStatus, Roster};
pub use worker::DispatchWorker;
