use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use cells::Timestamp;
use config::Settings;
use salting::{KeySalter, SaltedTable};
use store::{Connector, RowFilter, Store, TableName};
use tracing::{error, info};

use crate::{
    CancelHandle, ColumnAllowList, Job, JobReport, JobSource, JobState, LocalRunner,
    MigrationJob, MigrationMapper, MigrationReducer, PipelineError, TableInput, TextInput,
    TsvLayout, TsvMapper,
};

/// Builds migration jobs, validates them against the store, and runs them.
///
/// Configuration is handed in at construction; nothing is read from the
/// environment here.
pub struct PipelineDriver<C: Connector> {
    settings: Settings,
    connector: C,
    runner: LocalRunner,
}

fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn parse_table(role: &str, name: &str) -> Result<TableName, PipelineError> {
    if name.trim().is_empty() {
        return Err(PipelineError::JobSubmission(format!(
            "{role} table name is empty"
        )));
    }
    TableName::parse(name)
        .map_err(|e| PipelineError::JobSubmission(format!("{role} table: {e}")))
}

impl<C: Connector> PipelineDriver<C> {
    pub fn new(settings: Settings, connector: C) -> Self {
        let runner = LocalRunner::new(settings.job.clone());
        Self {
            settings,
            connector,
            runner,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Table-to-table copy of the allowed columns of every row passing
    /// `filter`.
    pub fn copy_job(
        &self,
        source: &str,
        destination: &str,
        columns: ColumnAllowList,
        filter: Option<RowFilter>,
    ) -> Result<Job, PipelineError> {
        let source = parse_table("source", source)?;
        let destination = parse_table("destination", destination)?;
        if columns.is_empty() {
            return Err(PipelineError::JobSubmission(
                "column allow-list is empty".to_string(),
            ));
        }

        let conn = self.connector.connect()?;
        if !conn.table_exists(&source)? {
            return Err(PipelineError::Schema(format!(
                "source table {source} does not exist"
            )));
        }
        check_destination(&conn, &destination, &columns)?;

        Ok(Job::new(MigrationJob {
            name: format!("{}: {} -> {}", self.settings.job.entry_point, source, destination),
            source: JobSource::Table(source),
            destination,
            columns,
            filter,
            timestamp: now_millis(),
        }))
    }

    /// File-to-table import of tab-separated lines.
    pub fn import_job(
        &self,
        destination: &str,
        input: impl AsRef<Path>,
        layout: TsvLayout,
        salter: Option<KeySalter>,
    ) -> Result<Job, PipelineError> {
        let destination = parse_table("destination", destination)?;
        let path = input.as_ref();
        if path.as_os_str().is_empty() {
            return Err(PipelineError::JobSubmission(
                "input path is empty".to_string(),
            ));
        }
        if !path.is_file() {
            return Err(PipelineError::JobSubmission(format!(
                "input path {} does not exist",
                path.display()
            )));
        }

        let columns = layout
            .columns()
            .iter()
            .fold(ColumnAllowList::new(), |list, (family, qualifier)| {
                list.with_column(family.clone(), qualifier.clone())
            });
        let conn = self.connector.connect()?;
        check_destination(&conn, &destination, &columns)?;
        if let Some(salter) = salter {
            SaltedTable::new(&conn, destination.clone(), salter).verify_layout()?;
        }

        Ok(Job::new(MigrationJob {
            name: format!(
                "{}: {} -> {}",
                self.settings.job.entry_point,
                path.display(),
                destination
            ),
            source: JobSource::File {
                path: path.to_path_buf(),
                layout,
                salter,
            },
            destination,
            columns,
            filter: None,
            timestamp: now_millis(),
        }))
    }

    /// Submits `job` and blocks until it finishes.
    ///
    /// Writes made before a failure stay in the destination.
    pub fn submit(&self, job: &mut Job) -> Result<JobReport, PipelineError> {
        job.transition(JobState::Submitted)?;
        info!(
            job = job.name(),
            entry_point = %self.settings.job.entry_point,
            "job submitted"
        );
        job.transition(JobState::Running)?;

        match self.execute(job.spec(), &job.cancel_handle()) {
            Ok(report) => {
                job.succeed(report.clone())?;
                info!(job = job.name(), state = %job.state(), "job finished");
                Ok(report)
            }
            Err(err) => {
                job.transition(JobState::Failed)?;
                Err(err)
            }
        }
    }

    /// Submits `job` and turns the outcome into a process exit status:
    /// `0` on success, `1` on any failure.
    pub fn run(&self, job: &mut Job) -> i32 {
        match self.submit(job) {
            Ok(_) => 0,
            Err(err) => {
                error!(job = job.name(), error = %err, "job failed");
                1
            }
        }
    }

    fn execute(
        &self,
        spec: &MigrationJob,
        cancel: &CancelHandle,
    ) -> Result<JobReport, PipelineError> {
        match &spec.source {
            JobSource::Table(source) => {
                let mut input =
                    TableInput::new(source.clone()).with_families(spec.columns.families().cloned());
                if let Some(filter) = &spec.filter {
                    input = input.with_filter(filter.clone());
                }
                let mapper = MigrationMapper::new(spec.columns.clone());
                self.runner.run(
                    &self.connector,
                    &input,
                    &mapper,
                    &MigrationReducer,
                    &spec.destination,
                    cancel,
                )
            }
            JobSource::File {
                path,
                layout,
                salter,
            } => {
                let input = TextInput::new(path.clone(), self.settings.job.split_lines);
                let mut mapper = TsvMapper::new(layout.clone(), spec.timestamp);
                if let Some(salter) = salter {
                    mapper = mapper.with_salter(*salter);
                }
                if let Some(filter) = &spec.filter {
                    mapper = mapper.with_filter(filter.clone());
                }
                self.runner.run(
                    &self.connector,
                    &input,
                    &mapper,
                    &MigrationReducer,
                    &spec.destination,
                    cancel,
                )
            }
        }
    }
}

/// The destination exists and has every family the job writes.
fn check_destination(
    store: &dyn Store,
    destination: &TableName,
    columns: &ColumnAllowList,
) -> Result<(), PipelineError> {
    let schema = store.table_schema(destination)?;
    for family in columns.families() {
        if !schema.has_family(family) {
            return Err(PipelineError::Schema(format!(
                "column family {family} does not exist in table {destination}"
            )));
        }
    }
    Ok(())
}
