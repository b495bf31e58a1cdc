//! # CLI - Saltbridge Command Line
//!
//! Runs migration jobs against the column-family store and exposes a few
//! administrative and query commands around salted tables. Results go to
//! stdout; logs go to stderr.
//!
//! ## Commands
//!
//! ```text
//! import <destination> <input> [--buckets N] [--column fam:qual]...
//!                                     Load a tab-separated file into a table
//! copy <source> <destination> --column fam[:qual]... [--row-contains S]
//!                                     Copy selected columns between tables
//! create-table <name> --family fam[:versions]... [--buckets N]
//!                                     Create a table, pre-split per bucket
//! list                                List tables
//! scan <table> [--limit N]            Print every row of a table
//! query <table> --buckets N [--start A] [--end B] [--ordered]
//!                                     Logical range query over a salted table
//! ```
//!
//! ## Configuration
//!
//! Settings come from the environment and may be overridden per invocation
//! with `--set key=value`:
//!
//! ```text
//! SALTBRIDGE_COORDINATOR_HOSTS  store.coordinator.hosts        (default: localhost)
//! SALTBRIDGE_CLIENT_PORT        store.coordinator.client-port  (default: 2181)
//! SALTBRIDGE_DATA_DIR           store.data-dir                 (default: data/store)
//! SALTBRIDGE_JOURNAL_SYNC       store.journal-sync             (default: true)
//! SALTBRIDGE_ENTRY_POINT        job.entry-point
//! SALTBRIDGE_REDUCE_TASKS       job.reduce-tasks               (default: 4)
//! SALTBRIDGE_MAX_TASK_ATTEMPTS  job.max-task-attempts          (default: 4)
//! SALTBRIDGE_SPLIT_LINES        job.split-lines                (default: 10000)
//! ```
//!
//! `RUST_LOG` controls log verbosity (default `info`).
//!
//! ## Exit status
//!
//! `0` on success, `1` on any failure.
//!
//! ## Example
//!
//! ```text
//! $ cli create-table student --family base_info:3 --buckets 3
//! $ cli import student students.tsv --buckets 3
//! $ cli query student --buckets 3 --start 1001 --end 1003 --ordered
//! 001_1001 base_info:name=zhangsan
//! ...
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use cells::{to_string_binary, FamilyName, Row};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use config::Settings;
use pipeline::{ColumnAllowList, PipelineDriver, TsvLayout};
use salting::{KeySalter, LogicalRange, SaltedTable};
use store::{
    Connector, FamilyDescriptor, LocalStore, RowFilter, Scan, Store, TableDescriptor, TableName,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Bucket prefixes are always at least this many digits (`000_`, `001_`).
const SALT_WIDTH: usize = 3;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Salted-key tables and batch migration for a column-family store", long_about = None)]
struct Args {
    /// Configuration override applied after the environment (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a tab-separated file: row key, then one field per column.
    Import {
        destination: String,
        input: PathBuf,
        /// Salt row keys into this many buckets.
        #[arg(long)]
        buckets: Option<u32>,
        /// Destination column of each field after the key
        /// (default: base_info:name base_info:sex).
        #[arg(long = "column", value_name = "FAMILY:QUALIFIER")]
        columns: Vec<String>,
    },
    /// Copy the allowed columns of every row from one table to another.
    Copy {
        source: String,
        destination: String,
        #[arg(long = "column", value_name = "FAMILY[:QUALIFIER]", required = true)]
        columns: Vec<String>,
        /// Only rows whose key contains this text.
        #[arg(long)]
        row_contains: Option<String>,
    },
    /// Create a table, pre-split into one region per bucket.
    CreateTable {
        name: String,
        #[arg(long = "family", value_name = "FAMILY[:VERSIONS]", required = true)]
        families: Vec<String>,
        #[arg(long)]
        buckets: Option<u32>,
    },
    /// List tables.
    List,
    /// Print the rows of a table.
    Scan {
        table: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Query a logical key range of a salted table.
    Query {
        table: String,
        #[arg(long)]
        buckets: u32,
        /// Inclusive start; empty means the first key.
        #[arg(long, default_value = "")]
        start: String,
        /// Inclusive end; omitted means no upper bound.
        #[arg(long)]
        end: Option<String>,
        /// Merge buckets into logical key order.
        #[arg(long, default_value_t = false)]
        ordered: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // usage errors exit 1 like every other failure
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let mut settings = Settings::from_env().context("loading configuration")?;
    for entry in &args.overrides {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("--set {entry:?} is not KEY=VALUE"))?;
        settings.set(key.trim(), value.trim())?;
    }
    let store = LocalStore::from_config(&settings.store).context("opening store")?;

    match args.command {
        Command::Import {
            destination,
            input,
            buckets,
            columns,
        } => {
            let layout = if columns.is_empty() {
                TsvLayout::default_columns()?
            } else {
                TsvLayout::parse(&columns)?
            };
            let salter = buckets.map(salter_for).transpose()?;
            let driver = PipelineDriver::new(settings, store);
            let mut job = driver
                .import_job(&destination, &input, layout, salter)
                .context("configuring import")?;
            Ok(exit_code(driver.run(&mut job)))
        }

        Command::Copy {
            source,
            destination,
            columns,
            row_contains,
        } => {
            let columns = ColumnAllowList::parse(&columns)?;
            let filter = row_contains.map(|s| RowFilter::KeyContains(s.into_bytes()));
            let driver = PipelineDriver::new(settings, store);
            let mut job = driver
                .copy_job(&source, &destination, columns, filter)
                .context("configuring copy")?;
            Ok(exit_code(driver.run(&mut job)))
        }

        Command::CreateTable {
            name,
            families,
            buckets,
        } => {
            let descriptor = table_descriptor(&name, &families)?;
            let conn = store.connect()?;
            match buckets {
                Some(n) => {
                    SaltedTable::create(&conn, &descriptor, salter_for(n)?)?;
                }
                None => conn.create_table(&descriptor, None)?,
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::List => {
            let conn = store.connect()?;
            for table in conn.list_tables()? {
                println!("{table}");
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Scan { table, limit } => {
            let conn = store.connect()?;
            let table = TableName::parse(&table)?;
            let rows = conn.scan(&table, &Scan::new())?;
            let mut count = 0usize;
            for row in rows.take(limit.unwrap_or(usize::MAX)) {
                print_row(&row?);
                count += 1;
            }
            println!("({count} rows)");
            Ok(ExitCode::SUCCESS)
        }

        Command::Query {
            table,
            buckets,
            start,
            end,
            ordered,
        } => {
            let conn = store.connect()?;
            let name = TableName::parse(&table)?;
            let table = SaltedTable::new(&conn, name, salter_for(buckets)?);
            table.verify_layout()?;
            let range = match end {
                Some(end) => LogicalRange::inclusive(start, end),
                None => LogicalRange::from(start),
            };
            let mut count = 0usize;
            for row in table.range_query(&range, ordered)? {
                print_row(&row?);
                count += 1;
            }
            println!("({count} rows)");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn salter_for(buckets: u32) -> Result<KeySalter> {
    Ok(KeySalter::new(buckets)?.with_min_width(SALT_WIDTH))
}

/// `name` with families given as `family` or `family:max_versions`.
fn table_descriptor(name: &str, families: &[String]) -> Result<TableDescriptor> {
    let mut descriptor = TableDescriptor::new(TableName::parse(name)?);
    for spec in families {
        let (family, versions) = match spec.split_once(':') {
            Some((family, versions)) => {
                let versions: usize = versions
                    .parse()
                    .with_context(|| format!("bad version count in {spec:?}"))?;
                (family, Some(versions))
            }
            None => (spec.as_str(), None),
        };
        let mut fd = FamilyDescriptor::new(FamilyName::new(family)?);
        if let Some(versions) = versions {
            if versions == 0 {
                bail!("family {family} must keep at least one version");
            }
            fd = fd.with_max_versions(versions);
        }
        descriptor = descriptor.with_family(fd);
    }
    Ok(descriptor)
}

fn print_row(row: &Row) {
    let cells: Vec<String> = row
        .cells()
        .map(|c| {
            format!(
                "{}:{}={}",
                c.family,
                to_string_binary(c.qualifier),
                to_string_binary(c.value)
            )
        })
        .collect();
    println!("{} {}", to_string_binary(row.key()), cells.join(" "));
}

fn exit_code(status: i32) -> ExitCode {
    if status == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
