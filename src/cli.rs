use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::credentials::{CredentialError, CredentialStore};
use crate::dispatch::Dispatcher;
use crate::error::SpoolerError;
use crate::spooler::{shared, store, Job, JobHeap};

/// Print spooler: HTTP service by default, maintenance commands otherwise
#[derive(Parser, Debug)]
#[command(name = "print-spooler", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the credential file
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Work with the job file without starting the server
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Register a new user
    Add { username: String, password: String },
    /// Check a username/password pair
    Check { username: String, password: String },
}

#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// List persisted jobs by priority
    List,
    /// Load the job file, run one dispatch round, save the rest
    Dispatch,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Spooler(#[from] SpoolerError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("Invalid credentials for {0}")]
    AccessDenied(String),
}

/// Run a maintenance command
pub async fn run(command: Command, config: &Config) -> Result<(), CliError> {
    match command {
        Command::User { action } => run_user(action, config),
        Command::Jobs { action } => run_jobs(action, config).await,
    }
}

fn run_user(action: UserAction, config: &Config) -> Result<(), CliError> {
    let credentials = CredentialStore::new(&config.users_file);
    match action {
        UserAction::Add { username, password } => {
            credentials.register(&username, &password)?;
            println!("[OK] Registered {}", username);
        }
        UserAction::Check { username, password } => {
            if !credentials.verify(&username, &password)? {
                return Err(CliError::AccessDenied(username));
            }
            println!("[OK] Access granted for {}", username);
        }
    }
    Ok(())
}

async fn run_jobs(action: JobsAction, config: &Config) -> Result<(), CliError> {
    let heap = JobHeap::restore(store::load(&config.jobs_file)?, config.max_jobs)?;

    match action {
        JobsAction::List => {
            print_jobs(&heap.by_priority());
        }
        JobsAction::Dispatch => {
            let dispatcher = Arc::new(Dispatcher::new(
                shared(heap),
                config.printers,
                config.time_scale,
            ));
            let report = dispatcher.run().await;

            for job in &report.printed {
                println!(
                    "  Printer {} printed {}",
                    job.printer.unwrap_or_default(),
                    job.id
                );
            }
            if report.halted_on_delayed {
                println!("[!] All remaining jobs are delayed ({} waiting)", report.remaining);
            } else if report.remaining == 0 {
                println!("[OK] All jobs completed");
            }

            let remaining = dispatcher.heap().lock().await.snapshot();
            store::save(&config.jobs_file, &remaining)?;
            info!("Saved {} remaining jobs", remaining.len());
        }
    }
    Ok(())
}

fn print_jobs(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("[ Empty Queue ]");
        return;
    }
    println!("  {:<8} {:<10} {:<5} {:<20} Created", "ID", "Type", "Prio", "Status");
    for job in jobs {
        println!(
            "  {:<8} {:<10} {:<5} {:<20} {}",
            job.id,
            format!("{} {}", job.kind.icon(), job.kind.code()),
            job.priority,
            job.status.to_string(),
            job.created_at.format("%H:%M:%S")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["print-spooler"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["print-spooler", "user", "add", "ann", "pw"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::User { action: UserAction::Add { ref username, .. } }) if username == "ann"
        ));

        let cli = Cli::try_parse_from(["print-spooler", "jobs", "dispatch"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Jobs { action: JobsAction::Dispatch })
        ));
    }

    #[tokio::test]
    async fn test_jobs_dispatch_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            jobs_file: dir.path().join("jobs.txt"),
            time_scale: std::time::Duration::ZERO,
            ..Config::default()
        };
        std::fs::write(
            &config.jobs_file,
            "PDF1,PDF,2,Queued,None\nIMG2,IMG,1,Delayed,paper jam\nTXT3,TXT,3,Queued,None\n",
        )
        .unwrap();

        run(Command::Jobs { action: JobsAction::Dispatch }, &config)
            .await
            .unwrap();

        let left = store::load(&config.jobs_file).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "IMG2");
    }

    #[tokio::test]
    async fn test_user_check_rejects_bad_password() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            users_file: dir.path().join("users.txt"),
            ..Config::default()
        };

        run(
            Command::User {
                action: UserAction::Add {
                    username: "ann".into(),
                    password: "pw".into(),
                },
            },
            &config,
        )
        .await
        .unwrap();

        let err = run(
            Command::User {
                action: UserAction::Check {
                    username: "ann".into(),
                    password: "nope".into(),
                },
            },
            &config,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::AccessDenied(_)));
    }
}
