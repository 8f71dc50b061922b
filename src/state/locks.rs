use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::dao::id::EntityId;

/// Kind of record a lock protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockScope {
    /// Review references and rating of a game.
    Game,
    /// Likes, dislikes and comments of a review.
    Review,
    /// Collections and played hours of a user.
    User,
}

type LockKey = (LockScope, EntityId);
type LockTable = DashMap<LockKey, Arc<Mutex<()>>>;

/// Per-record async mutexes serialising read-modify-write sequences inside this process.
///
/// Entries are created on demand and dropped once the last holder releases them.
#[derive(Default, Clone)]
pub struct EntityLocks {
    table: Arc<LockTable>,
}

/// Held lock on one record. Releasing it prunes the table entry when unused.
pub struct EntityLockGuard {
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<LockTable>,
}

impl EntityLocks {
    /// Empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the record identified by `scope` and `id`.
    pub async fn lock(&self, scope: LockScope, id: &EntityId) -> EntityLockGuard {
        let key = (scope, id.clone());
        let mutex = self
            .table
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        let guard = mutex.lock_owned().await;
        EntityLockGuard {
            key,
            guard: Some(guard),
            table: self.table.clone(),
        }
    }

    /// Number of records currently tracked.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no record is currently tracked.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Drop for EntityLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the table itself still references the mutex: nobody holds or awaits it.
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn same_record_is_exclusive() {
        let locks = EntityLocks::new();
        let id = EntityId::generate();

        let held = locks.lock(LockScope::Game, &id).await;
        let blocked = timeout(Duration::from_millis(50), locks.lock(LockScope::Game, &id)).await;
        assert!(blocked.is_err());

        drop(held);
        let reacquired = timeout(Duration::from_millis(50), locks.lock(LockScope::Game, &id)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn scopes_and_records_do_not_contend() {
        let locks = EntityLocks::new();
        let id = EntityId::generate();

        let _game = locks.lock(LockScope::Game, &id).await;
        let other = timeout(Duration::from_millis(50), locks.lock(LockScope::User, &id)).await;
        assert!(other.is_ok());
        let another = timeout(
            Duration::from_millis(50),
            locks.lock(LockScope::Game, &EntityId::generate()),
        )
        .await;
        assert!(another.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = EntityLocks::new();
        let id = EntityId::generate();
        {
            let _guard = locks.lock(LockScope::Review, &id).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }
}
