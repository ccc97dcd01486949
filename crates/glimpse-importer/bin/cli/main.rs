mod cli;

use crate::cli::{StorageBackendArg, CLI};
use clap::Parser;
use glimpse_core::Repository;
use glimpse_generator::{RandomGenerator, RetryPolicy, UniqueAllocator};
use glimpse_importer::{load_file, ImportError, ImportOptions, ImportSummary, ImporterService};
use glimpse_storage::{MySqlRepository, SqliteRepository};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    glimpse_telemetry::init(config.log_format.into())?;

    info!(
        json_file = %config.json_file.display(),
        storage_backend = %config.storage,
        max_views = config.max_views,
        code_length = config.code_length,
        "starting import"
    );

    let records = load_file(&config.json_file).await?;
    let options = ImportOptions::builder().max_views(config.max_views).build();
    let policy = match config.max_attempts {
        Some(max) => RetryPolicy::builder().max_attempts(max).build(),
        None => RetryPolicy::default(),
    };
    let allocator = UniqueAllocator::new(RandomGenerator::new(config.code_length)?, policy);

    let result = match config.storage {
        StorageBackendArg::Sqlite => {
            let repository = SqliteRepository::connect(&config.database_url).await?;
            repository.init_schema().await?;
            run_import(repository, allocator, options, records).await
        }
        StorageBackendArg::Mysql => {
            let repository = MySqlRepository::connect(&config.database_url).await?;
            repository.init_schema().await?;
            run_import(repository, allocator, options, records).await
        }
    };

    match result {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(ImportError::Aborted {
            entry,
            summary,
            cause,
        }) => {
            print_summary(&summary);
            anyhow::bail!("import aborted at entry {entry}: {cause}")
        }
        Err(other) => Err(other.into()),
    }
}

async fn run_import<R: Repository>(
    repository: R,
    allocator: UniqueAllocator<RandomGenerator>,
    options: ImportOptions,
    records: Vec<Value>,
) -> Result<ImportSummary, ImportError> {
    ImporterService::new(repository, allocator, options)?
        .import(records)
        .await
}

fn print_summary(summary: &ImportSummary) {
    let mut lines: Vec<(usize, String)> = summary
        .inserted
        .iter()
        .map(|r| (r.index, format!("inserted: {}", r.code)))
        .chain(
            summary
                .skipped
                .iter()
                .map(|r| (r.index, format!("skipped: {}", r.reason))),
        )
        .chain(
            summary
                .failed
                .iter()
                .map(|r| (r.index, format!("failed: {}", r.cause))),
        )
        .collect();
    lines.sort_by_key(|(index, _)| *index);

    for (index, line) in lines {
        println!("[entry {index}] {line}");
    }
    print!(
        "\nImport summary: inserted={}, skipped={}",
        summary.inserted_count(),
        summary.skipped_count()
    );
    if summary.failed_count() > 0 {
        print!(", failed={}", summary.failed_count());
    }
    println!();
}
