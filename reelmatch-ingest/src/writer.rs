//! Work queue consumers
//!
//! A fixed number of writers drain one bounded queue. Each writer opens its
//! own store session and keeps it for its whole life, so no connection is
//! shared and no locking is needed around inserts. Records are independent;
//! the global insertion order across writers is not preserved.

use crate::IngestError;
use async_trait::async_trait;
use reelmatch_common::db::{insert_title, StoredTitleRecord};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Append-only destination for ingested titles
#[async_trait]
pub trait TitleStore: Send + Sync + 'static {
    type Writer: TitleWriter;

    /// Open a session owned by a single writer
    async fn open_writer(&self) -> reelmatch_common::Result<Self::Writer>;
}

/// One writer's exclusive store session
#[async_trait]
pub trait TitleWriter: Send + 'static {
    async fn insert(&mut self, record: &StoredTitleRecord) -> reelmatch_common::Result<()>;
}

/// SQLite-backed store; every writer checks out its own pooled connection
#[derive(Debug, Clone)]
pub struct SqliteTitleStore {
    pool: SqlitePool,
}

impl SqliteTitleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TitleStore for SqliteTitleStore {
    type Writer = SqliteTitleWriter;

    async fn open_writer(&self) -> reelmatch_common::Result<SqliteTitleWriter> {
        let conn = self.pool.acquire().await?;
        Ok(SqliteTitleWriter { conn })
    }
}

/// Holds one connection (and its cached insert statement) until dropped
pub struct SqliteTitleWriter {
    conn: PoolConnection<Sqlite>,
}

#[async_trait]
impl TitleWriter for SqliteTitleWriter {
    async fn insert(&mut self, record: &StoredTitleRecord) -> reelmatch_common::Result<()> {
        insert_title(&mut *self.conn, record).await
    }
}

type SharedQueue = Arc<Mutex<mpsc::Receiver<StoredTitleRecord>>>;

/// Running writer tasks
pub struct WriterPool {
    tasks: JoinSet<Result<u64, IngestError>>,
}

impl WriterPool {
    /// Start `writers` tasks draining `queue`
    ///
    /// A writer that fails cancels `cancel`, which stops its siblings and the
    /// producer.
    pub fn start<S: TitleStore>(
        store: Arc<S>,
        writers: usize,
        queue: mpsc::Receiver<StoredTitleRecord>,
        cancel: CancellationToken,
    ) -> Self {
        let queue: SharedQueue = Arc::new(Mutex::new(queue));
        let mut tasks = JoinSet::new();

        for index in 0..writers.max(1) {
            tasks.spawn(run_writer(
                index,
                Arc::clone(&store),
                Arc::clone(&queue),
                cancel.clone(),
            ));
        }

        info!("Started {} writers", writers.max(1));
        Self { tasks }
    }

    /// Wait for every writer to exit
    ///
    /// Returns the total number of stored records, or the first error.
    pub async fn join(mut self) -> Result<u64, IngestError> {
        let mut written = 0;
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next().await {
            match joined.map_err(IngestError::from).and_then(|r| r) {
                Ok(count) => written += count,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}

async fn run_writer<S: TitleStore>(
    index: usize,
    store: Arc<S>,
    queue: SharedQueue,
    cancel: CancellationToken,
) -> Result<u64, IngestError> {
    let mut writer = match store.open_writer().await {
        Ok(writer) => writer,
        Err(source) => {
            error!(writer = index, "Failed to open store session: {}", source);
            cancel.cancel();
            return Err(IngestError::OpenWriter {
                writer: index,
                source,
            });
        }
    };

    let mut written = 0u64;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(writer = index, "Writer cancelled");
                break;
            }
            record = receive(&queue) => record,
        };

        let Some(record) = next else {
            debug!(writer = index, written, "Queue closed, writer stopping");
            break;
        };

        if let Err(source) = writer.insert(&record).await {
            error!(writer = index, title_id = record.id, "Insert failed: {}", source);
            cancel.cancel();
            return Err(IngestError::Storage {
                writer: index,
                title_id: record.id,
                source,
            });
        }
        written += 1;
    }

    Ok(written)
}

/// Take the next record; the lock is released before the caller inserts
async fn receive(queue: &SharedQueue) -> Option<StoredTitleRecord> {
    queue.lock().await.recv().await
}
