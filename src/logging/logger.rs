//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, TaskEntry, TaskStatus};
use super::utils::log_file_path;
use crate::tasks::TaskStats;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// Every message is also written to a persistent log file at
/// `$XDG_CACHE_HOME/dotfiles-setup/<command>.log` (default
/// `~/.cache/dotfiles-setup/<command>.log`) by the file layer installed in
/// [`init_subscriber`](super::subscriber::init_subscriber).
#[derive(Debug)]
pub struct Logger {
    tasks: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger for `command`.
    ///
    /// Only stores the log file path for display in the run summary; the
    /// file itself is opened by the subscriber.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self::with_log_file(log_file_path(command))
    }

    /// Create a logger that reports `log_file` as its run log.
    #[must_use]
    pub const fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded task entries.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a task result for the summary.
    pub fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.tasks.lock() {
            guard.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
                stats: None,
            });
        }
    }

    /// Attach per-item counters to the most recent entry for `name`, or
    /// create an entry if the task has not been recorded yet.
    pub fn record_stats(&self, name: &str, stats: &TaskStats) {
        if let Ok(mut guard) = self.tasks.lock() {
            if let Some(entry) = guard.iter_mut().rev().find(|t| t.name == name) {
                entry.stats = Some(stats.clone());
            } else {
                guard.push(TaskEntry {
                    name: name.to_string(),
                    status: TaskStatus::Ok,
                    message: None,
                    stats: Some(stats.clone()),
                });
            }
        }
    }

    /// Return `true` if any recorded task has failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Count the number of failed tasks.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.tasks.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|t| t.status == TaskStatus::Failed)
                .count()
        })
    }

    /// Sum the per-item counters of every recorded task.
    #[must_use]
    pub fn totals(&self) -> TaskStats {
        self.tasks.lock().map_or_else(
            |_| TaskStats::default(),
            |guard| {
                guard
                    .iter()
                    .filter_map(|t| t.stats.as_ref())
                    .fold(TaskStats::default(), |mut acc, s| {
                        acc += s.clone();
                        acc
                    })
            },
        )
    }

    /// Print the summary of all recorded tasks followed by the item tally.
    pub fn print_summary(&self) {
        let tasks = self.task_entries();
        if tasks.is_empty() {
            return;
        }

        self.stage("Summary");

        for task in &tasks {
            let (icon, color) = match task.status {
                TaskStatus::Ok => ("✓", "\x1b[32m"),
                TaskStatus::NotApplicable => ("·", "\x1b[2m"),
                TaskStatus::Skipped => ("○", "\x1b[33m"),
                TaskStatus::DryRun => ("~", "\x1b[37m"),
                TaskStatus::Failed => ("✗", "\x1b[31m"),
            };

            let detail = task
                .message
                .clone()
                .or_else(|| {
                    task.stats
                        .as_ref()
                        .map(|s| s.summary(task.status == TaskStatus::DryRun))
                })
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{detail}\x1b[0m", task.name));
        }

        let totals = self.totals();
        self.info(&format!(
            "items: \x1b[32m{} changed\x1b[0m, \x1b[36m{} backed up\x1b[0m, {} already ok, \
             \x1b[33m{} skipped\x1b[0m, \x1b[31m{} failed\x1b[0m",
            totals.changed, totals.backed_up, totals.already_ok, totals.skipped, totals.failed
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.record_task(name, status, message);
    }

    fn record_stats(&self, name: &str, stats: &TaskStats) {
        self.record_stats(name, stats);
    }
}
