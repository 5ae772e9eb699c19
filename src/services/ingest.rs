//! Streaming ingestion of one upload into gateway-local storage.
//!
//! The first chunk names the object. Its record is created with size `0`,
//! the payload file is opened under the workspace directory, every chunk is
//! appended in order, the file is fsynced, and only then is the record's
//! size finalized. Any failure after the record exists rolls back both the
//! file and the record through [`PendingObject`], including when the
//! ingestion future itself is dropped mid-stream.

use crate::models::{
    object::{Object, ObjectChunk},
    workspace::Workspace,
};
use crate::services::{
    backend::BackendError,
    error::{ObjectError, ObjectResult},
    local_store::{LocalStore, ObjectWriter},
    object_repository::{ObjectRepository, RepositoryError},
};
use futures::{Stream, StreamExt};
use std::{io, path::PathBuf, sync::Arc};
use tracing::{debug, error, info, warn};

/// Outcome of a completed upload stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestedObject {
    pub object_id: String,
    pub size: i64,
}

/// Drives one upload stream from its first chunk to a finalized record.
pub struct Ingestion {
    repo: Arc<dyn ObjectRepository>,
    local: Arc<dyn LocalStore>,
    workspace_dir: PathBuf,
}

impl Ingestion {
    pub fn new(
        repo: Arc<dyn ObjectRepository>,
        local: Arc<dyn LocalStore>,
        workspace_dir: PathBuf,
    ) -> Self {
        Self {
            repo,
            local,
            workspace_dir,
        }
    }

    pub async fn run<S>(self, workspace: &Workspace, chunks: S) -> ObjectResult<IngestedObject>
    where
        S: Stream<Item = io::Result<ObjectChunk>> + Send,
    {
        let mut chunks = Box::pin(chunks);

        let first = match chunks.next().await {
            Some(Ok(chunk)) => chunk,
            Some(Err(err)) => {
                error!(workspace = %workspace.name, error = %err, "error receiving first chunk");
                return Err(ObjectError::Receive(err));
            }
            None => {
                warn!(workspace = %workspace.name, "upload stream ended before any content");
                return Err(ObjectError::EmptyStream);
            }
        };

        if first.hash.trim().is_empty() {
            return Err(ObjectError::MissingHash);
        }

        info!(workspace = %workspace.name, hash = %first.hash, "creating object");
        let object = self.acquire_record(workspace, &first).await?;
        let path = self.workspace_dir.join(&object.external_id);
        let pending = PendingObject::new(self.repo.clone(), self.local.clone(), object, path);

        let writer = match self.open_file(&pending).await {
            Ok(writer) => writer,
            Err(err) => return Err(pending.fail(ObjectError::CreateFile(err)).await),
        };

        let size = match write_chunks(writer, first, &mut chunks).await {
            Ok(size) => size,
            Err(err) => return Err(pending.fail(err).await),
        };

        debug!(object_id = %pending.object.external_id, size, "updating object size");
        let finalized = self
            .repo
            .update_size(&pending.object.external_id, size)
            .await;
        if let Err(err) = finalized {
            return Err(pending.fail(ObjectError::Finalize(err)).await);
        }

        let object = pending.commit();
        info!(object_id = %object.external_id, size, "upload completed");
        Ok(IngestedObject {
            object_id: object.external_id,
            size,
        })
    }

    /// Create the size-0 record, or adopt the existing one for the hash when
    /// `overwrite` is set or its payload is missing. An adopted record becomes
    /// owned by this stream and is rolled back with it.
    async fn acquire_record(
        &self,
        workspace: &Workspace,
        first: &ObjectChunk,
    ) -> ObjectResult<Object> {
        match self.repo.create(&first.hash, 0, workspace.id).await {
            Ok(object) => Ok(object),
            Err(RepositoryError::Conflict) => {
                let existing = self
                    .repo
                    .get_by_hash(&first.hash, workspace.id)
                    .await
                    .map_err(ObjectError::Lookup)?
                    .ok_or(ObjectError::Create(RepositoryError::Conflict))?;

                if !first.overwrite {
                    let path = self.workspace_dir.join(&existing.external_id);
                    let present = self
                        .local
                        .exists(&path)
                        .await
                        .map_err(|err| ObjectError::ExistenceCheck(BackendError::Local(err)))?;
                    if present {
                        return Err(ObjectError::AlreadyExists {
                            hash: first.hash.clone(),
                        });
                    }
                }

                self.repo
                    .update_size(&existing.external_id, 0)
                    .await
                    .map_err(ObjectError::Create)?;
                debug!(
                    object_id = %existing.external_id,
                    overwrite = first.overwrite,
                    "adopting existing object record"
                );
                Ok(Object { size: 0, ..existing })
            }
            Err(err) => {
                error!(hash = %first.hash, error = %err, "error creating object record");
                Err(ObjectError::Create(err))
            }
        }
    }

    async fn open_file(&self, pending: &PendingObject) -> io::Result<Box<dyn ObjectWriter>> {
        self.local.ensure_dir(&self.workspace_dir).await?;
        debug!(path = %pending.path.display(), "creating file");
        self.local.create(&pending.path).await
    }
}

/// Append `first` and every following chunk, then sync. The writer is
/// consumed so the file handle is closed before any rollback runs.
async fn write_chunks<S>(
    mut writer: Box<dyn ObjectWriter>,
    first: ObjectChunk,
    rest: &mut S,
) -> ObjectResult<i64>
where
    S: Stream<Item = io::Result<ObjectChunk>> + Unpin,
{
    let mut size = 0i64;
    let mut count = 1usize;

    writer
        .write_chunk(&first.content)
        .await
        .map_err(ObjectError::Write)?;
    size += first.content.len() as i64;

    while let Some(next) = rest.next().await {
        // Identity is fixed by the first chunk; later hashes are ignored.
        let chunk = next.map_err(ObjectError::Receive)?;
        writer
            .write_chunk(&chunk.content)
            .await
            .map_err(ObjectError::Write)?;
        size += chunk.content.len() as i64;
        count += 1;
    }

    debug!(chunks = count, size, "end of stream, syncing file");
    writer.sync().await.map_err(ObjectError::Sync)?;
    Ok(size)
}

/// A record (and possibly a payload file) created for an upload that has not
/// finished yet.
///
/// Must end in [`commit`](Self::commit) or [`fail`](Self::fail). Dropping it
/// unsettled, which is what happens when the client disconnects and the
/// request future is cancelled, schedules the same cleanup on the runtime.
struct PendingObject {
    repo: Arc<dyn ObjectRepository>,
    local: Arc<dyn LocalStore>,
    object: Object,
    path: PathBuf,
    settled: bool,
}

impl PendingObject {
    fn new(
        repo: Arc<dyn ObjectRepository>,
        local: Arc<dyn LocalStore>,
        object: Object,
        path: PathBuf,
    ) -> Self {
        Self {
            repo,
            local,
            object,
            path,
            settled: false,
        }
    }

    fn commit(mut self) -> Object {
        self.settled = true;
        self.object.clone()
    }

    /// Roll back and hand the error back for reporting.
    ///
    /// The rollback runs as its own task, so it completes even if the caller
    /// is cancelled while waiting for it.
    async fn fail(mut self, err: ObjectError) -> ObjectError {
        self.settled = true;
        error!(
            object_id = %self.object.external_id,
            error = %err,
            cause = ?std::error::Error::source(&err).map(|e| e.to_string()),
            "upload failed, rolling back"
        );
        let task = tokio::spawn(rollback(
            self.repo.clone(),
            self.local.clone(),
            self.object.external_id.clone(),
            self.path.clone(),
        ));
        if let Err(join_err) = task.await {
            warn!(object_id = %self.object.external_id, error = %join_err, "rollback task failed");
        }
        err
    }
}

impl Drop for PendingObject {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let repo = self.repo.clone();
        let local = self.local.clone();
        let external_id = self.object.external_id.clone();
        let path = self.path.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(object_id = %external_id, "upload cancelled, rolling back");
                handle.spawn(rollback(repo, local, external_id, path));
            }
            Err(_) => warn!(
                object_id = %external_id,
                "upload dropped without a runtime, record and file may be orphaned"
            ),
        }
    }
}

async fn rollback(
    repo: Arc<dyn ObjectRepository>,
    local: Arc<dyn LocalStore>,
    external_id: String,
    path: PathBuf,
) {
    if let Err(err) = local.remove(&path).await {
        warn!(path = %path.display(), error = %err, "failed to remove partial file");
    }
    if let Err(err) = repo.delete_by_external_id(&external_id).await {
        warn!(object_id = %external_id, error = %err, "failed to delete object record");
    }
}
