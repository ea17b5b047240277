//! Print spooler built around an indexed min-heap scheduler.
//!
//! Jobs are ordered by priority in [`spooler::JobHeap`], which keeps an
//! id-to-slot index in step with every heap move so any job can be found,
//! reprioritized or cancelled by id in O(log n). [`dispatch`] feeds queued
//! jobs to simulated printers, [`api`] exposes the scheduler over HTTP.

pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod shutdown;
pub mod spooler;

pub use error::{Result, SpoolerError};
