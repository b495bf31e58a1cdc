use std::fmt;
use std::path::PathBuf;

use cells::Timestamp;
use salting::KeySalter;
use store::{RowFilter, TableName};

use crate::{CancelHandle, ColumnAllowList, JobReport, PipelineError, TsvLayout};

/// Lifecycle of a submitted job.
///
/// ```text
/// Configured ──> Submitted ──> Running ──> Succeeded
///                                 └──────> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Configured,
    Submitted,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Configured, JobState::Submitted)
                | (JobState::Submitted, JobState::Running)
                | (JobState::Running, JobState::Succeeded)
                | (JobState::Running, JobState::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Configured => "CONFIGURED",
            JobState::Submitted => "SUBMITTED",
            JobState::Running => "RUNNING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Where a migration reads from.
#[derive(Debug, Clone)]
pub enum JobSource {
    Table(TableName),
    /// Tab-separated lines, mapped through `layout`. With a salter the row
    /// key is written salted.
    File {
        path: PathBuf,
        layout: TsvLayout,
        salter: Option<KeySalter>,
    },
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobSource::Table(table) => write!(f, "{table}"),
            JobSource::File { path, .. } => write!(f, "{}", path.display()),
        }
    }
}

/// A validated job description. Immutable once built.
#[derive(Debug, Clone)]
pub struct MigrationJob {
    pub name: String,
    pub source: JobSource,
    pub destination: TableName,
    /// Columns copied from a table source. For a file source, the layout's
    /// columns.
    pub columns: ColumnAllowList,
    /// Row key predicate applied to source rows.
    pub filter: Option<RowFilter>,
    /// Stamped on cells that carry no timestamp of their own.
    pub timestamp: Timestamp,
}

/// A job and where it is in its lifecycle. Submitted at most once.
///
/// Each job carries its own [`CancelHandle`]; cancelling it never affects
/// another job.
#[derive(Debug)]
pub struct Job {
    spec: MigrationJob,
    state: JobState,
    report: Option<JobReport>,
    cancel: CancelHandle,
}

impl Job {
    pub fn new(spec: MigrationJob) -> Self {
        Self {
            spec,
            state: JobState::Configured,
            report: None,
            cancel: CancelHandle::new(),
        }
    }

    pub fn spec(&self) -> &MigrationJob {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Cancels this job, before or while it runs.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Counters of a succeeded job.
    pub fn report(&self) -> Option<&JobReport> {
        self.report.as_ref()
    }

    pub(crate) fn transition(&mut self, next: JobState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::JobSubmission(format!(
                "job {} cannot move from {} to {}",
                self.spec.name, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn succeed(&mut self, report: JobReport) -> Result<(), PipelineError> {
        self.transition(JobState::Succeeded)?;
        self.report = Some(report);
        Ok(())
    }
}
