use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Job file, loaded once at start and overwritten at shutdown
    pub jobs_file: PathBuf,

    /// Credential file, one `username,password` record per line
    pub users_file: PathBuf,

    /// Number of simulated printers served per dispatch pass
    /// Default: 5
    pub printers: usize,

    /// Optional ceiling on tracked jobs; unbounded when unset
    pub max_jobs: Option<usize>,

    /// Simulated time per unit of a job's estimated duration
    /// Default: 100ms
    pub time_scale: Duration,

    /// Whether the background worker dispatches on its own
    /// Default: true
    pub auto_dispatch: bool,

    /// Period between background dispatch rounds
    /// Default: 5s
    pub dispatch_interval: Duration,

    /// Maximum payload size for all requests (in bytes)
    /// Default: 10MB (10 * 1024 * 1024)
    pub max_payload_size: usize,

    /// Directory for rotating log files
    pub log_dir: PathBuf,

    /// Address the HTTP server binds to
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs_file: PathBuf::from("jobs.txt"),
            users_file: PathBuf::from("users.txt"),
            printers: 5,
            max_jobs: None,
            time_scale: Duration::from_millis(100),
            auto_dispatch: true,
            dispatch_interval: Duration::from_secs(5),
            max_payload_size: 10 * 1024 * 1024,
            log_dir: PathBuf::from("logs"),
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// All variables are optional:
    /// - JOBS_FILE: job file path (default: jobs.txt)
    /// - USERS_FILE: credential file path (default: users.txt)
    /// - PRINTERS: simulated printer count, must be at least 1 (default: 5)
    /// - MAX_JOBS: job ceiling (default: unbounded)
    /// - TIME_SCALE_MS: milliseconds per duration unit (default: 100)
    /// - AUTO_DISPATCH: run the background worker (default: true)
    /// - DISPATCH_INTERVAL_SECS: seconds between rounds (default: 5)
    /// - MAX_PAYLOAD_SIZE: maximum request payload size in bytes (default: 10485760 = 10MB)
    /// - LOG_DIR: log directory (default: logs)
    /// - BIND_ADDR: listen address (default: 127.0.0.1:8080)
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unparsable numbers fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let printers = match lookup("PRINTERS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => return Err("PRINTERS must be at least 1".to_string()),
                Ok(n) => n,
                Err(_) => defaults.printers,
            },
            None => defaults.printers,
        };

        let auto_dispatch = lookup("AUTO_DISPATCH")
            .map(|s| !matches!(s.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.auto_dispatch);

        Ok(Config {
            jobs_file: lookup("JOBS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_file),
            users_file: lookup("USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.users_file),
            printers,
            max_jobs: parsed("MAX_JOBS").map(|n| n as usize),
            time_scale: parsed("TIME_SCALE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.time_scale),
            auto_dispatch,
            dispatch_interval: parsed("DISPATCH_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.dispatch_interval),
            max_payload_size: parsed("MAX_PAYLOAD_SIZE")
                .map(|n| n as usize)
                .unwrap_or(defaults.max_payload_size),
            log_dir: lookup("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}
