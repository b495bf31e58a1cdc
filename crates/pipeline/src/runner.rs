//! In-process execution of a map → shuffle → reduce job.
//!
//! Map tasks (one per input split) and reduce tasks (one per shuffle
//! partition) run on the rayon pool. Every task attempt opens its own store
//! connection and drops it when the attempt ends, whatever the outcome. The
//! shuffle runs only after every map task has finished.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backon::{BlockingRetryable, ConstantBuilder};
use cells::Put;
use config::JobConfig;
use rayon::prelude::*;
use store::{Connector, TableName};
use tracing::{debug, error, info, warn};

use crate::{
    Emitter, InputFormat, InputSplit, KeyGroup, Mapper, PipelineError, ReduceContext, Reducer,
    ShuffleStage,
};

/// Cancels a running job. Tasks check it between records; a cancelled job
/// fails with [`PipelineError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Counters of a finished job. Only successful task attempts are counted,
/// except `failed_attempts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub map_tasks: usize,
    pub reduce_tasks: usize,
    pub map_input_records: u64,
    pub map_output_records: u64,
    pub reduce_groups: u64,
    pub puts_written: u64,
    pub failed_attempts: u64,
}

#[derive(Default)]
struct Counters {
    map_input_records: AtomicU64,
    map_output_records: AtomicU64,
    reduce_groups: AtomicU64,
    puts_written: AtomicU64,
    failed_attempts: AtomicU64,
}

impl Counters {
    fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    fn report(&self, map_tasks: usize, reduce_tasks: usize) -> JobReport {
        JobReport {
            map_tasks,
            reduce_tasks,
            map_input_records: self.map_input_records.load(Ordering::Relaxed),
            map_output_records: self.map_output_records.load(Ordering::Relaxed),
            reduce_groups: self.reduce_groups.load(Ordering::Relaxed),
            puts_written: self.puts_written.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
        }
    }
}

/// Runs jobs on the local rayon pool.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    config: JobConfig,
}

impl LocalRunner {
    pub fn new(config: JobConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Runs one job to completion and blocks until every task is done.
    /// `cancel` belongs to this job only.
    pub fn run<C, F, M, R>(
        &self,
        connector: &C,
        input: &F,
        mapper: &M,
        reducer: &R,
        destination: &TableName,
        cancel: &CancelHandle,
    ) -> Result<JobReport, PipelineError>
    where
        C: Connector,
        F: InputFormat,
        M: Mapper<F::Record>,
        R: Reducer,
    {
        if self.config.reduce_tasks == 0 {
            return Err(PipelineError::JobSubmission(
                "reduce task count must be at least 1".to_string(),
            ));
        }
        cancel.check()?;

        let splits = {
            let conn = connector.connect()?;
            input.splits(&conn)?
        };
        let counters = Counters::default();

        // -------------------- Map --------------------
        info!(tasks = splits.len(), "map phase started");
        let outputs = splits
            .par_iter()
            .map(|split| self.map_task(connector, input, mapper, split, cancel, &counters))
            .collect::<Result<Vec<_>, _>>()?;

        // -------------------- Shuffle --------------------
        cancel.check()?;
        let shuffle = ShuffleStage::new(self.config.reduce_tasks);
        let partitions = shuffle.shuffle(outputs);
        debug!(partitions = partitions.len(), "shuffle complete");

        // -------------------- Reduce --------------------
        info!(tasks = partitions.len(), "reduce phase started");
        partitions
            .par_iter()
            .enumerate()
            .map(|(index, groups)| {
                let task = ReduceTask {
                    index,
                    destination,
                    groups,
                };
                self.reduce_task(connector, reducer, task, cancel, &counters)
            })
            .collect::<Result<Vec<()>, _>>()?;

        let report = counters.report(splits.len(), partitions.len());
        info!(
            map_tasks = report.map_tasks,
            reduce_tasks = report.reduce_tasks,
            puts = report.puts_written,
            failed_attempts = report.failed_attempts,
            "job complete"
        );
        Ok(report)
    }

    fn map_task<C, F, M>(
        &self,
        connector: &C,
        input: &F,
        mapper: &M,
        split: &InputSplit,
        cancel: &CancelHandle,
        counters: &Counters,
    ) -> Result<Vec<(Vec<u8>, Put)>, PipelineError>
    where
        C: Connector,
        F: InputFormat,
        M: Mapper<F::Record>,
    {
        let task = format!("map-{}", split.index());
        let (inputs, output) = self.with_attempts(&task, cancel, counters, || {
            let conn = connector.connect()?;
            let mut out = Emitter::new();
            let mut inputs = 0u64;
            for record in input.read(&conn, split)? {
                cancel.check()?;
                inputs += 1;
                mapper
                    .map(record?, &mut out)
                    .map_err(|e| e.into_pipeline(&task))?;
            }
            Ok((inputs, out.into_records()))
        })?;

        Counters::add(&counters.map_input_records, inputs);
        Counters::add(&counters.map_output_records, output.len() as u64);
        debug!(task = %task, records = inputs, emitted = output.len(), "map task done");
        Ok(output)
    }

    fn reduce_task<C, R>(
        &self,
        connector: &C,
        reducer: &R,
        ReduceTask {
            index,
            destination,
            groups,
        }: ReduceTask<'_>,
        cancel: &CancelHandle,
        counters: &Counters,
    ) -> Result<(), PipelineError>
    where
        C: Connector,
        R: Reducer,
    {
        let task = format!("reduce-{index}");
        let written = self.with_attempts(&task, cancel, counters, || {
            let conn = connector.connect()?;
            let mut ctx = ReduceContext::new(&conn, destination);
            for group in groups {
                cancel.check()?;
                reducer.reduce(&group.key, &group.records, &mut ctx)?;
            }
            Ok(ctx.written())
        })?;

        Counters::add(&counters.reduce_groups, groups.len() as u64);
        Counters::add(&counters.puts_written, written);
        debug!(task = %task, groups = groups.len(), puts = written, "reduce task done");
        Ok(())
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error, or
    /// `max_task_attempts` is reached. Retries are immediate.
    fn with_attempts<T, A>(
        &self,
        task: &str,
        cancel: &CancelHandle,
        counters: &Counters,
        mut attempt: A,
    ) -> Result<T, PipelineError>
    where
        A: FnMut() -> Result<T, PipelineError>,
    {
        let max_attempts = self.config.max_task_attempts.max(1);
        let backoff = ConstantBuilder::default()
            .with_delay(Duration::ZERO)
            .with_max_times(max_attempts as usize - 1);
        let attempts = Cell::new(0u32);

        let result = (|| -> Result<T, PipelineError> {
            cancel.check()?;
            attempts.set(attempts.get() + 1);
            let result = attempt();
            if matches!(&result, Err(err) if !matches!(err, PipelineError::Cancelled)) {
                Counters::add(&counters.failed_attempts, 1);
            }
            result
        })
        .retry(backoff)
        .sleep(std::thread::sleep)
        .when(PipelineError::is_retryable)
        .notify(|err: &PipelineError, _: Duration| {
            warn!(task, attempt = attempts.get(), error = %err, "task attempt failed, retrying");
        })
        .call();

        result.map_err(|err| match err {
            PipelineError::Cancelled => err,
            err if err.is_retryable() => {
                let attempts = attempts.get();
                error!(task, attempts, error = %err, "task out of attempts");
                PipelineError::TaskFailed {
                    task: task.to_string(),
                    attempts,
                    source: Box::new(err),
                }
            }
            err => {
                error!(task, attempt = attempts.get(), error = %err, "task failed");
                err
            }
        })
    }
}

/// One shuffle partition and where its reduce task writes.
struct ReduceTask<'a> {
    index: usize,
    destination: &'a TableName,
    groups: &'a [KeyGroup],
}
