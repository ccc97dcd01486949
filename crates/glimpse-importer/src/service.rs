use crate::error::{ImportError, RecordError};
use glimpse_core::{Code, NewEntry, Repository, StorageError, DEFAULT_MAX_VIEWS};
use glimpse_generator::{Generator, GeneratorError, UniqueAllocator};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

/// Settings applied to every entry of a batch.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ImportOptions {
    /// View budget of each inserted entry.
    #[builder(default = DEFAULT_MAX_VIEWS)]
    pub max_views: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// An object that was stored, with its 1-based position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedRecord {
    pub index: usize,
    pub code: Code,
}

/// An input value that was not stored because it is not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

/// An object that could not be stored; the batch went on without it.
#[derive(Debug, Clone)]
pub struct FailedRecord {
    pub index: usize,
    pub cause: RecordError,
}

/// Per-record outcome of one batch.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub inserted: Vec<InsertedRecord>,
    pub skipped: Vec<SkippedRecord>,
    pub failed: Vec<FailedRecord>,
}

impl ImportSummary {
    pub fn inserted_count(&self) -> usize {
        self.inserted.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Codes handed out, in input order.
    pub fn codes(&self) -> impl Iterator<Item = &Code> {
        self.inserted.iter().map(|record| &record.code)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Turns parsed records into stored entries.
///
/// Each object gets a code from the [`UniqueAllocator`] and is inserted on
/// its own; there is no batch transaction. When an insert reports
/// `DuplicateCode` (another writer took the code after the existence check)
/// a new code is allocated, within the allocator's retry policy.
#[derive(Debug)]
pub struct ImporterService<R, G> {
    repository: Arc<R>,
    allocator: UniqueAllocator<G>,
    options: ImportOptions,
}

impl<R: Repository, G: Generator> ImporterService<R, G> {
    pub fn new(
        repository: R,
        allocator: UniqueAllocator<G>,
        options: ImportOptions,
    ) -> Result<Self, ImportError> {
        Self::from_shared(Arc::new(repository), allocator, options)
    }

    /// Creates an importer over a repository that other components also hold.
    pub fn from_shared(
        repository: Arc<R>,
        allocator: UniqueAllocator<G>,
        options: ImportOptions,
    ) -> Result<Self, ImportError> {
        if options.max_views == 0 {
            return Err(ImportError::InvalidOptions(
                "max views must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            repository,
            allocator,
            options,
        })
    }

    pub fn options(&self) -> ImportOptions {
        self.options
    }

    /// Stores one object under a freshly allocated code.
    pub async fn insert_object(&self, object: Map<String, Value>) -> Result<Code, RecordError> {
        let payload = serde_json::to_string(&Value::Object(object))
            .map_err(|e| RecordError::Serialize(e.to_string()))?;
        let policy = self.allocator.policy();
        let mut conflicts = 0u32;

        loop {
            let allocation = self.allocator.allocate(self.repository.as_ref()).await?;
            let entry = NewEntry::new(payload.clone(), self.options.max_views)?;

            match self.repository.insert(&allocation.code, entry).await {
                Ok(()) => return Ok(allocation.code),
                Err(StorageError::DuplicateCode(code)) => {
                    conflicts += 1;
                    warn!(code = %code, conflicts, "code taken between check and insert");
                    if !policy.allows(conflicts) {
                        return Err(GeneratorError::Exhausted {
                            attempts: conflicts,
                        }
                        .into());
                    }
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Imports `records` in order.
    ///
    /// Non-object records are skipped and objects that cannot be stored are
    /// recorded as failed; both are reported in the summary and the batch
    /// goes on. Only an unreachable storage backend stops the batch, with
    /// [`ImportError::Aborted`] carrying the summary up to that point.
    pub async fn import(&self, records: Vec<Value>) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::default();

        for (position, record) in records.into_iter().enumerate() {
            let index = position + 1;

            let object = match record {
                Value::Object(object) => object,
                other => {
                    let reason = format!("entry is not a JSON object (found {})", json_kind(&other));
                    warn!(entry = index, %reason, "skipped");
                    summary.skipped.push(SkippedRecord { index, reason });
                    continue;
                }
            };

            match self.insert_object(object).await {
                Ok(code) => {
                    debug!(entry = index, code = %code, "inserted");
                    summary.inserted.push(InsertedRecord { index, code });
                }
                Err(cause) if cause.is_unavailable() => {
                    error!(entry = index, error = %cause, "storage unavailable, aborting import");
                    return Err(ImportError::Aborted {
                        entry: index,
                        summary,
                        cause,
                    });
                }
                Err(cause) => {
                    warn!(entry = index, error = %cause, "failed to store entry");
                    summary.failed.push(FailedRecord { index, cause });
                }
            }
        }

        info!(
            inserted = summary.inserted_count(),
            skipped = summary.skipped_count(),
            failed = summary.failed_count(),
            "import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_records;
    use glimpse_core::ReadRepository;
    use glimpse_generator::{RandomGenerator, RetryPolicy, SeqGenerator};
    use glimpse_storage::{InMemoryRepository, SqliteRepository};
    use std::collections::HashSet;

    fn random_service(
        repo: InMemoryRepository,
    ) -> ImporterService<InMemoryRepository, RandomGenerator> {
        let allocator = UniqueAllocator::new(RandomGenerator::default(), RetryPolicy::default());
        ImporterService::new(repo, allocator, ImportOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn json_lines_with_comments() {
        let service = random_service(InMemoryRepository::new());
        let records = parse_records("{\"a\":1}\n\n# comment\n{\"b\":2}").unwrap();

        let summary = service.import(records).await.unwrap();

        assert_eq!(summary.inserted_count(), 2);
        assert_eq!(summary.skipped_count(), 0);
        let codes: HashSet<_> = summary.codes().collect();
        assert_eq!(codes.len(), 2);
    }

    #[tokio::test]
    async fn non_objects_are_skipped() {
        let service = random_service(InMemoryRepository::new());
        let records = parse_records(r#"[1, {"x":true}]"#).unwrap();

        let summary = service.import(records).await.unwrap();

        assert_eq!(summary.inserted_count(), 1);
        assert_eq!(summary.inserted[0].index, 2);
        assert_eq!(
            summary.skipped,
            vec![SkippedRecord {
                index: 1,
                reason: "entry is not a JSON object (found number)".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn stored_entries_carry_payload_and_default_budget() {
        let repo = Arc::new(InMemoryRepository::new());
        let allocator = UniqueAllocator::new(RandomGenerator::default(), RetryPolicy::default());
        let service =
            ImporterService::from_shared(Arc::clone(&repo), allocator, ImportOptions::default())
                .unwrap();

        let summary = service
            .import(parse_records(r#"{"name":"Zoë","n":[1,2]}"#).unwrap())
            .await
            .unwrap();

        let code = &summary.inserted[0].code;
        assert_eq!(code.len(), 6);
        let entry = repo.get(code).await.unwrap().unwrap();
        assert_eq!(entry.payload, r#"{"n":[1,2],"name":"Zoë"}"#);
        assert_eq!(entry.max_views, DEFAULT_MAX_VIEWS);
        assert_eq!(entry.views, 0);
    }

    #[tokio::test]
    async fn many_records_get_pairwise_distinct_codes() {
        let service = random_service(InMemoryRepository::new());
        let records: Vec<Value> = (0..300).map(|i| serde_json::json!({ "i": i })).collect();

        let summary = service.import(records).await.unwrap();

        let codes: HashSet<_> = summary.codes().collect();
        assert_eq!(codes.len(), 300);
    }

    #[tokio::test]
    async fn allocation_skips_existing_codes() {
        let repo = InMemoryRepository::new();
        let generator = SeqGenerator::new(6).unwrap();
        repo.insert(
            &generator.clone().generate().unwrap(),
            NewEntry::new("{}", 1).unwrap(),
        )
        .await
        .unwrap();

        let allocator = UniqueAllocator::new(generator, RetryPolicy::default());
        let service = ImporterService::new(repo, allocator, ImportOptions::default()).unwrap();

        let summary = service
            .import(parse_records(r#"{"a":1}"#).unwrap())
            .await
            .unwrap();
        assert_eq!(summary.inserted[0].code.as_str(), "AAAAAB");
    }

    #[tokio::test]
    async fn custom_view_budget() {
        let repo = Arc::new(InMemoryRepository::new());
        let allocator = UniqueAllocator::new(RandomGenerator::default(), RetryPolicy::default());
        let options = ImportOptions::builder().max_views(3).build();
        let service = ImporterService::from_shared(Arc::clone(&repo), allocator, options).unwrap();

        let summary = service.import(vec![serde_json::json!({})]).await.unwrap();

        let entry = repo.get(&summary.inserted[0].code).await.unwrap().unwrap();
        assert_eq!(entry.max_views, 3);
    }

    #[test]
    fn zero_view_budget_is_rejected() {
        let allocator = UniqueAllocator::new(RandomGenerator::default(), RetryPolicy::default());
        let options = ImportOptions::builder().max_views(0).build();

        let err = ImporterService::new(InMemoryRepository::new(), allocator, options).unwrap_err();
        assert!(matches!(err, ImportError::InvalidOptions(_)));
    }

    #[tokio::test]
    async fn exhausted_keyspace_fails_the_rest_but_completes() {
        // One-symbol codes: 36 of them for 40 objects.
        let policy = RetryPolicy::builder().max_attempts(500).build();
        let allocator = UniqueAllocator::new(SeqGenerator::new(1).unwrap(), policy);
        let service =
            ImporterService::new(InMemoryRepository::new(), allocator, ImportOptions::default())
                .unwrap();
        let records: Vec<Value> = (0..40).map(|i| serde_json::json!({ "i": i })).collect();

        let summary = service.import(records).await.unwrap();

        assert_eq!(summary.inserted_count(), 36);
        assert_eq!(summary.skipped_count(), 0);
        let failed: Vec<_> = summary.failed.iter().map(|r| r.index).collect();
        assert_eq!(failed, vec![37, 38, 39, 40]);
        assert!(summary.failed.iter().all(|r| matches!(
            r.cause,
            RecordError::Allocation(GeneratorError::Exhausted { attempts: 500 })
        )));
    }

    #[tokio::test]
    async fn failed_allocation_does_not_stop_later_records() {
        let repo = InMemoryRepository::new();
        repo.insert(&Code::new_unchecked("B"), NewEntry::new("{}", 1).unwrap())
            .await
            .unwrap();

        // Draws A, B, C in turn; B is taken and only one attempt is allowed.
        let policy = RetryPolicy::builder().max_attempts(1).build();
        let allocator = UniqueAllocator::new(SeqGenerator::new(1).unwrap(), policy);
        let service = ImporterService::new(repo, allocator, ImportOptions::default()).unwrap();

        let summary = service
            .import(parse_records(r#"[{"i":1}, {"i":2}, "x", {"i":3}]"#).unwrap())
            .await
            .unwrap();

        let inserted: Vec<_> = summary
            .inserted
            .iter()
            .map(|r| (r.index, r.code.as_str()))
            .collect();
        assert_eq!(inserted, vec![(1, "A"), (4, "C")]);
        assert_eq!(summary.skipped_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.failed[0].index, 2);
        assert!(matches!(
            summary.failed[0].cause,
            RecordError::Allocation(GeneratorError::Exhausted { attempts: 1 })
        ));
    }

    #[tokio::test]
    async fn unavailable_storage_aborts_with_full_summary() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.pool().close().await;
        let allocator = UniqueAllocator::new(RandomGenerator::default(), RetryPolicy::default());
        let service = ImporterService::new(repo, allocator, ImportOptions::default()).unwrap();

        let err = service
            .import(vec![
                serde_json::json!(1),
                serde_json::json!({"a": 1}),
                serde_json::json!({"b": 2}),
            ])
            .await
            .unwrap_err();

        match err {
            ImportError::Aborted {
                entry,
                summary,
                cause,
            } => {
                assert_eq!(entry, 2);
                assert_eq!(summary.skipped_count(), 1);
                assert_eq!(summary.skipped[0].index, 1);
                assert_eq!(summary.inserted_count(), 0);
                assert_eq!(summary.failed_count(), 0);
                assert!(cause.is_unavailable());
                assert!(matches!(
                    cause,
                    RecordError::Allocation(GeneratorError::Storage(_))
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn only_unreachable_storage_is_fatal() {
        let unavailable = RecordError::Storage(StorageError::Unavailable("closed".into()));
        let timeout =
            RecordError::Allocation(GeneratorError::Storage(StorageError::Timeout("slow".into())));
        let query = RecordError::Storage(StorageError::Query("bad".into()));
        let exhausted = RecordError::Allocation(GeneratorError::Exhausted { attempts: 3 });

        assert!(unavailable.is_unavailable());
        assert!(timeout.is_unavailable());
        assert!(!query.is_unavailable());
        assert!(!exhausted.is_unavailable());
    }

    #[tokio::test]
    async fn imports_into_sqlite() {
        let repo = Arc::new(SqliteRepository::in_memory().await.unwrap());
        let allocator = UniqueAllocator::new(RandomGenerator::default(), RetryPolicy::default());
        let service =
            ImporterService::from_shared(Arc::clone(&repo), allocator, ImportOptions::default())
                .unwrap();

        let summary = service
            .import(parse_records("{\"a\":1}\n{\"b\":2}\n3").unwrap())
            .await
            .unwrap();

        assert_eq!(summary.inserted_count(), 2);
        assert_eq!(summary.skipped_count(), 1);
        for code in summary.codes() {
            assert!(repo.exists(code).await.unwrap());
        }
    }
}
