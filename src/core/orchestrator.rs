//! Build orchestration across multiple projects
//!
//! Runs the external build tool once per [`ProjectEntry`], records every exit
//! code and reports start/finish events.
//!
//! Projects run through a bounded pool of `jobs` slots (one by default, which
//! is strictly sequential); a slot is reused as soon as its project ends.
//! Results are always reported in entry order. A
//! shared cancellation token implements "abort remaining on first failure":
//! not-yet-started projects keep the [`NOT_RUN_EXIT_CODE`] and in-flight
//! children are killed.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::defaults::{DEFAULT_JOBS, DEFAULT_TOOL, NOT_RUN_EXIT_CODE};
use crate::core::entry::ProjectEntry;
use crate::core::template::{ArgumentTemplate, BuildOptions};
use crate::error::OrchestrateError;
use crate::infra::process::{Invocation, ProcessExit, ProcessRunner};

/// What to do after a project exits nonzero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop starting projects after the first failure
    #[default]
    FailFast,
    /// Build every project, then report all failures
    KeepGoing,
}

/// How a run is executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Build tool program
    pub tool: String,
    /// Maximum projects built at once
    pub jobs: usize,
    /// Reaction to a failed project
    pub failure_policy: FailurePolicy,
    /// Route child stdout to stderr
    pub stdout_to_stderr: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            jobs: DEFAULT_JOBS,
            failure_policy: FailurePolicy::default(),
            stdout_to_stderr: false,
        }
    }
}

/// Progress notification for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// The build tool is about to start for a project
    Started {
        index: usize,
        command: String,
        project: String,
        targets: String,
    },
    /// The build tool finished for a project
    Finished {
        index: usize,
        command: String,
        project: String,
        exit_code: i32,
        success: bool,
    },
    /// The build tool could not be started for a project
    SpawnFailed {
        index: usize,
        project: String,
        error: String,
    },
}

/// Receives [`BuildEvent`]s as a run progresses
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &BuildEvent);
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn on_event(&self, event: &BuildEvent) {
        (**self).on_event(event);
    }
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn on_event(&self, _event: &BuildEvent) {}
}

/// One project's exit code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitCodeEntry {
    pub project: String,
    pub exit_code: i32,
}

/// Exit code of every project in a run, in entry order
///
/// Every slot starts at [`NOT_RUN_EXIT_CODE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExitCodeRecord {
    entries: Vec<ExitCodeEntry>,
}

impl ExitCodeRecord {
    /// One not-yet-run slot per entry
    pub fn new(entries: &[ProjectEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|entry| ExitCodeEntry {
                    project: entry.identity(),
                    exit_code: NOT_RUN_EXIT_CODE,
                })
                .collect(),
        }
    }

    fn set(&mut self, index: usize, exit_code: i32) {
        if let Some(slot) = self.entries.get_mut(index) {
            slot.exit_code = exit_code;
        }
    }

    /// Exit code of a project by identity
    pub fn get(&self, project: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|slot| slot.project == project)
            .map(|slot| slot.exit_code)
    }

    /// Exit codes in entry order
    pub fn codes(&self) -> Vec<i32> {
        self.entries.iter().map(|slot| slot.exit_code).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExitCodeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Why a project counted against the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunFailure {
    /// The project exited nonzero
    ExitCode { project: String, exit_code: i32 },
    /// The build tool could not be started
    Spawn { project: String, error: String },
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Build tool verb
    pub command: String,
    /// Build tool program
    pub tool: String,
    /// Whether the run as a whole succeeded
    pub success: bool,
    /// Whether the run was cancelled from outside
    pub cancelled: bool,
    /// Exit code per project
    pub exit_codes: ExitCodeRecord,
    /// Failures in entry order
    pub failures: Vec<RunFailure>,
}

impl RunReport {
    /// The error that decided the run, if it failed
    pub fn error(&self) -> Option<OrchestrateError> {
        if self.cancelled {
            return Some(OrchestrateError::Cancelled);
        }

        self.failures.first().map(|failure| match failure {
            RunFailure::ExitCode { project, exit_code } => OrchestrateError::ChildProcessFailure {
                command: self.command.clone(),
                project: project.clone(),
                exit_code: *exit_code,
            },
            RunFailure::Spawn { project, error } => OrchestrateError::SpawnFailure {
                program: self.tool.clone(),
                project: project.clone(),
                error: error.clone(),
            },
        })
    }
}

/// How one project ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum UnitOutcome {
    NotRun,
    Exited(i32),
    Killed(i32),
    SpawnFailed(String),
}

/// Runs the build tool over a list of projects
#[derive(Debug)]
pub struct BuildOrchestrator<R, S = NoopSink> {
    runner: R,
    sink: S,
    settings: RunSettings,
    cancel: CancellationToken,
}

impl<R: ProcessRunner> BuildOrchestrator<R, NoopSink> {
    /// Create an orchestrator with default settings and no event sink
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            sink: NoopSink,
            settings: RunSettings::default(),
            cancel: CancellationToken::new(),
        }
    }
}

impl<R: ProcessRunner, S: EventSink> BuildOrchestrator<R, S> {
    /// Replace the run settings
    #[must_use]
    pub fn with_settings(mut self, settings: RunSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Send events to `sink`
    pub fn with_sink<T: EventSink>(self, sink: T) -> BuildOrchestrator<R, T> {
        BuildOrchestrator {
            runner: self.runner,
            sink,
            settings: self.settings,
            cancel: self.cancel,
        }
    }

    /// Stop the run when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Get the run settings
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Build every entry with `command` and `options`
    pub async fn run(
        &self,
        command: &str,
        entries: &[ProjectEntry],
        options: &BuildOptions,
    ) -> RunReport {
        tracing::info!(
            "Starting {} {command} for {} projects with {} jobs",
            self.settings.tool,
            entries.len(),
            self.settings.jobs.max(1)
        );

        let template = ArgumentTemplate::build(command, options);
        tracing::debug!("Argument template: {}", template.tokens().join(" "));

        let mut exit_codes = ExitCodeRecord::new(entries);
        let abort = self.cancel.child_token();

        // A slot frees as soon as its project ends; outcomes are put back in
        // entry order afterwards
        let (template, abort) = (&template, &abort);
        let mut outcomes = vec![UnitOutcome::NotRun; entries.len()];
        let mut finished = stream::iter(entries.iter().enumerate())
            .map(|(index, entry)| async move {
                let outcome = self
                    .run_entry(index, entry, command, template, options, abort)
                    .await;
                (index, outcome)
            })
            .buffer_unordered(self.settings.jobs.max(1));
        while let Some((index, outcome)) = finished.next().await {
            outcomes[index] = outcome;
        }

        let mut failures = Vec::new();
        for ((index, entry), outcome) in entries.iter().enumerate().zip(outcomes) {
            match outcome {
                UnitOutcome::NotRun => {}
                UnitOutcome::Killed(code) => exit_codes.set(index, code),
                UnitOutcome::Exited(code) => {
                    exit_codes.set(index, code);
                    if code != 0 && !options.ignore_exit_codes {
                        failures.push(RunFailure::ExitCode {
                            project: entry.identity(),
                            exit_code: code,
                        });
                    }
                }
                UnitOutcome::SpawnFailed(error) => failures.push(RunFailure::Spawn {
                    project: entry.identity(),
                    error,
                }),
            }
        }

        let cancelled = self.cancel.is_cancelled();
        let success = failures.is_empty() && !cancelled;
        if cancelled {
            tracing::warn!("{} {command} cancelled", self.settings.tool);
        }

        RunReport {
            command: command.to_string(),
            tool: self.settings.tool.clone(),
            success,
            cancelled,
            exit_codes,
            failures,
        }
    }

    async fn run_entry(
        &self,
        index: usize,
        entry: &ProjectEntry,
        command: &str,
        template: &ArgumentTemplate,
        options: &BuildOptions,
        abort: &CancellationToken,
    ) -> UnitOutcome {
        if abort.is_cancelled() {
            return UnitOutcome::NotRun;
        }

        let tool = &self.settings.tool;
        let project = entry.identity();
        let targets = options.targets_label();

        tracing::info!(
            command,
            project = %project,
            targets = %targets,
            "Started {command} of project {project}..."
        );
        self.sink.on_event(&BuildEvent::Started {
            index,
            command: command.to_string(),
            project: project.clone(),
            targets,
        });

        let invocation = Invocation {
            program: tool.clone(),
            args: template.args_for(entry),
            working_dir: entry.working_directory().to_path_buf(),
            stdout_to_stderr: self.settings.stdout_to_stderr,
        };
        tracing::debug!(
            working_dir = %invocation.working_dir.display(),
            "{}",
            invocation.command_line()
        );

        let exit = match self.runner.run(&invocation, abort).await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::error!(command, project = %project, "Failed to start {tool}: {e}");
                self.sink.on_event(&BuildEvent::SpawnFailed {
                    index,
                    project,
                    error: e.to_string(),
                });
                abort.cancel();
                return UnitOutcome::SpawnFailed(e.to_string());
            }
        };

        let exit_code = exit.code();
        let killed = matches!(exit, ProcessExit::Killed(_));
        tracing::info!(
            command,
            project = %project,
            exit_code,
            "Finished {command} of project {project}..."
        );
        self.sink.on_event(&BuildEvent::Finished {
            index,
            command: command.to_string(),
            project: project.clone(),
            exit_code,
            success: exit_code == 0 && !killed,
        });

        if killed {
            tracing::warn!(project = %project, "{tool} {command} was stopped with exit code {exit_code}.");
            return UnitOutcome::Killed(exit_code);
        }

        if exit_code == 0 {
            tracing::info!("{tool} {command} succeeded with exit code {exit_code}.");
        } else if options.ignore_exit_codes {
            tracing::info!(project = %project, "{tool} {command} exited with code {exit_code} (ignored).");
        } else {
            tracing::error!(project = %project, "{tool} {command} failed with exit code {exit_code}.");
            if self.settings.failure_policy == FailurePolicy::FailFast {
                abort.cancel();
            }
        }

        UnitOutcome::Exited(exit_code)
    }
}
