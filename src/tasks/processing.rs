use super::context::Context;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use dotfiles_setup::tasks::{TaskResult, TaskStats};
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("pwsh not found".into());
/// let done = TaskResult::Done(TaskStats::default());
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(done, TaskResult::Done(_)));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped (tool unavailable, nothing configured, …).
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
    /// Task processed a list of items; counters attached.
    Done(TaskStats),
}

/// Counters for batch tasks that process many items.
///
/// # Examples
///
/// ```
/// use dotfiles_setup::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 3, already_ok: 10, ..TaskStats::default() };
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
/// ```
///
/// Backups, skips and failures only appear when non-zero:
///
/// ```
/// use dotfiles_setup::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 2, backed_up: 1, already_ok: 0, skipped: 1, failed: 1 };
/// assert_eq!(
///     stats.summary(false),
///     "2 changed, 1 backed up, 0 already ok, 1 skipped, 1 failed"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Items created, installed or replaced.
    pub changed: u32,
    /// Items whose previous occupant was moved to a backup (subset of `changed`).
    pub backed_up: u32,
    /// Items already in the desired state.
    pub already_ok: u32,
    /// Items not processed (missing source, invalid state, filtered out).
    pub skipped: u32,
    /// Items that failed to apply.
    pub failed: u32,
}

impl TaskStats {
    /// Format the summary string (e.g. "3 changed, 1 backed up, 10 already ok").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let (verb, backup) = if dry_run {
            ("would change", "would back up")
        } else {
            ("changed", "backed up")
        };
        let mut parts = vec![format!("{} {verb}", self.changed)];
        if self.backed_up > 0 {
            parts.push(format!("{} {backup}", self.backed_up));
        }
        parts.push(format!("{} already ok", self.already_ok));
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        parts.join(", ")
    }

    /// Log the summary and wrap the counters in a [`TaskResult`].
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        TaskResult::Done(self)
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.backed_up += other.backed_up;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Configuration for the generic resource processing loop.
///
/// Controls which [`ResourceState`] variants are acted on. Apply failures
/// are never fatal: they are logged as warnings and counted as `failed`.
///
/// # Examples
///
/// ```
/// use dotfiles_setup::tasks::ProcessOpts;
///
/// let opts = ProcessOpts::apply_all("link");
/// assert!(opts.fix_incorrect && opts.fix_missing);
///
/// let opts = ProcessOpts::install_missing("install");
/// assert!(!opts.fix_incorrect && opts.fix_missing);
/// ```
#[derive(Debug)]
pub struct ProcessOpts<'a> {
    /// Verb for log messages (e.g., "install", "link", "create").
    pub verb: &'a str,
    /// Treat `Incorrect` as fixable (apply the change). If `false`, skip it.
    pub fix_incorrect: bool,
    /// Treat `Missing` as fixable (apply the change). If `false`, skip it.
    pub fix_missing: bool,
}

impl<'a> ProcessOpts<'a> {
    /// Fix both missing and incorrect resources.
    #[must_use]
    pub const fn apply_all(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: true,
            fix_missing: true,
        }
    }

    /// Install only missing resources; never touch ones that exist.
    #[must_use]
    pub const fn install_missing(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: false,
            fix_missing: true,
        }
    }
}

/// Process resources by checking each one's current state and applying as
/// needed, then log the summary.
///
/// A resource whose state cannot be determined is counted as failed.
#[must_use]
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> TaskResult {
    let mut stats = TaskStats::default();
    for resource in resources {
        match resource.current_state() {
            Ok(current) => stats += process_single(ctx, &resource, current, opts),
            Err(e) => {
                ctx.log.warn(&format!(
                    "cannot check {}: {e:#}",
                    resource.description()
                ));
                stats.failed += 1;
            }
        }
    }
    stats.finish(ctx)
}

/// Process resources with pre-computed states and return the counters
/// without logging a summary.
///
/// For tasks that inspect state themselves (e.g. symlinks, which report a
/// richer per-item status than [`ResourceState`] carries).
#[must_use]
pub fn process_resource_states<R: Resource>(
    ctx: &Context,
    resource_states: impl IntoIterator<Item = (R, ResourceState)>,
    opts: &ProcessOpts,
) -> TaskStats {
    let mut stats = TaskStats::default();
    for (resource, current) in resource_states {
        stats += process_single(ctx, &resource, current, opts);
    }
    stats
}

/// Process a single resource given its current state, returning a stats delta.
fn process_single<R: Resource>(
    ctx: &Context,
    resource: &R,
    resource_state: ResourceState,
    opts: &ProcessOpts,
) -> TaskStats {
    let desc = resource.description();
    let mut delta = TaskStats::default();
    match resource_state {
        ResourceState::Correct => {
            ctx.log.info(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Invalid { reason } => {
            ctx.log.info(&format!("skipped {desc}: {reason}"));
            delta.skipped += 1;
        }
        ResourceState::Missing if !opts.fix_missing => {
            ctx.log.debug(&format!("skipping {desc} (missing)"));
            delta.skipped += 1;
        }
        ResourceState::Incorrect { current } if !opts.fix_incorrect => {
            ctx.log
                .debug(&format!("skipping {desc} (currently {current})"));
            delta.skipped += 1;
        }
        resource_state @ (ResourceState::Missing | ResourceState::Incorrect { .. }) => {
            if ctx.dry_run {
                let msg = if let ResourceState::Incorrect { ref current } = resource_state {
                    format!("would {} {desc} (currently {current})", opts.verb)
                } else {
                    format!("would {} {desc}", opts.verb)
                };
                ctx.log.dry_run(&msg);
                delta.changed += 1;
                return delta;
            }
            delta += apply_resource(ctx, resource, opts);
        }
    }
    delta
}

/// Apply a single resource change, returning a stats delta.
fn apply_resource<R: Resource>(ctx: &Context, resource: &R, opts: &ProcessOpts) -> TaskStats {
    let desc = resource.description();
    let mut delta = TaskStats::default();
    let change = match resource.apply() {
        Ok(change) => change,
        Err(e) => {
            ctx.log
                .warn(&format!("failed to {} {desc}: {e:#}", opts.verb));
            delta.failed += 1;
            return delta;
        }
    };

    match change {
        ResourceChange::Applied => {
            ctx.log.info(&format!("{}: {desc}", opts.verb));
            delta.changed += 1;
        }
        ResourceChange::BackedUp { backup } => {
            ctx.log.info(&format!(
                "{}: {desc} (previous moved to {})",
                opts.verb,
                backup.display()
            ));
            delta.changed += 1;
            delta.backed_up += 1;
        }
        ResourceChange::AlreadyCorrect => {
            ctx.log.info(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceChange::Skipped { reason } => {
            ctx.log.info(&format!("skipped {desc}: {reason}"));
            delta.skipped += 1;
        }
    }
    delta
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::{RecordingLog, context_with};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct MockResource {
        state_result: Result<ResourceState, String>,
        apply_result: Result<ResourceChange, String>,
    }

    impl MockResource {
        fn new(state: ResourceState) -> Self {
            Self {
                state_result: Ok(state),
                apply_result: Ok(ResourceChange::Applied),
            }
        }

        fn with_apply(mut self, result: Result<ResourceChange, String>) -> Self {
            self.apply_result = result;
            self
        }
    }

    impl Resource for MockResource {
        fn description(&self) -> String {
            "mock resource".to_string()
        }

        fn current_state(&self) -> Result<ResourceState> {
            self.state_result
                .clone()
                .map_err(|s| anyhow::anyhow!("{s}"))
        }

        fn apply(&self) -> Result<ResourceChange> {
            self.apply_result
                .clone()
                .map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    fn run(
        states: Vec<MockResource>,
        opts: &ProcessOpts,
        dry_run: bool,
    ) -> (TaskStats, Arc<RecordingLog>) {
        let (mut ctx, log) = context_with(Vec::new());
        ctx.dry_run = dry_run;
        let TaskResult::Done(stats) = process_resources(&ctx, states, opts) else {
            panic!("process_resources always reports counters")
        };
        (stats, log)
    }

    #[test]
    fn summary_omits_zero_optional_counters() {
        let stats = TaskStats {
            changed: 1,
            backed_up: 1,
            ..TaskStats::default()
        };
        assert_eq!(stats.summary(false), "1 changed, 1 backed up, 0 already ok");
    }

    #[test]
    fn add_assign_sums_every_counter() {
        let mut a = TaskStats {
            changed: 1,
            failed: 1,
            ..TaskStats::default()
        };
        a += TaskStats {
            changed: 2,
            backed_up: 1,
            already_ok: 3,
            skipped: 4,
            failed: 5,
        };
        assert_eq!(
            a,
            TaskStats {
                changed: 3,
                backed_up: 1,
                already_ok: 3,
                skipped: 4,
                failed: 6,
            }
        );
    }

    #[test]
    fn each_state_is_counted() {
        let (stats, _log) = run(
            vec![
                MockResource::new(ResourceState::Correct),
                MockResource::new(ResourceState::Missing),
                MockResource::new(ResourceState::Invalid {
                    reason: "source missing".to_string(),
                }),
                MockResource::new(ResourceState::Incorrect {
                    current: "existing file".to_string(),
                })
                .with_apply(Ok(ResourceChange::BackedUp {
                    backup: PathBuf::from("/home/u/file.bak_20240101_000000"),
                })),
            ],
            &ProcessOpts::apply_all("link"),
            false,
        );
        assert_eq!(
            stats,
            TaskStats {
                changed: 2,
                backed_up: 1,
                already_ok: 1,
                skipped: 1,
                failed: 0,
            }
        );
    }

    #[test]
    fn apply_error_is_counted_and_run_continues() {
        let (stats, log) = run(
            vec![
                MockResource::new(ResourceState::Missing).with_apply(Err("denied".to_string())),
                MockResource::new(ResourceState::Missing),
            ],
            &ProcessOpts::apply_all("link"),
            false,
        );
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.changed, 1);
        assert!(log.contains("[warn] failed to link mock resource: denied"));
    }

    #[test]
    fn state_error_is_counted_as_failed() {
        let mut broken = MockResource::new(ResourceState::Missing);
        broken.state_result = Err("registry unreadable".to_string());
        let (stats, log) = run(vec![broken], &ProcessOpts::apply_all("link"), false);
        assert_eq!(stats.failed, 1);
        assert!(log.contains("cannot check mock resource"));
    }

    #[test]
    fn install_missing_leaves_incorrect_alone() {
        let (stats, _log) = run(
            vec![MockResource::new(ResourceState::Incorrect {
                current: "old".to_string(),
            })
            .with_apply(Err("must not be called".to_string()))],
            &ProcessOpts::install_missing("install"),
            false,
        );
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn dry_run_never_applies() {
        let (stats, log) = run(
            vec![
                MockResource::new(ResourceState::Missing)
                    .with_apply(Err("must not be called".to_string())),
                MockResource::new(ResourceState::Incorrect {
                    current: "existing file".to_string(),
                })
                .with_apply(Err("must not be called".to_string())),
            ],
            &ProcessOpts::apply_all("link"),
            true,
        );
        assert_eq!(stats.changed, 2);
        assert_eq!(stats.failed, 0);
        assert!(log.contains("[dry run] would link mock resource (currently existing file)"));
        assert!(log.contains("2 would change, 0 already ok"));
    }
}
