//! Per-column task caches
//!
//! A board view needs one [`TaskCache`] per column. The registry keeps them
//! in a map keyed by column id and reconciles that map with each snapshot:
//! caches are created for new columns and dropped for removed ones.

use super::TaskCache;
use std::collections::HashMap;
use std::sync::Arc;
use taskboard_shared::models::{Column, Task};
use taskboard_shared::store::RemoteStore;
use uuid::Uuid;

/// Map from column id to that column's task cache
pub struct TaskCacheRegistry {
    store: Arc<dyn RemoteStore>,
    caches: HashMap<Uuid, TaskCache>,
}

impl TaskCacheRegistry {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        TaskCacheRegistry {
            store,
            caches: HashMap::new(),
        }
    }

    /// Reconciles the registry with a board's columns and seeds every cache
    ///
    /// Columns missing from `tasks` are seeded empty.
    pub fn sync(&mut self, columns: &[Column], tasks: &HashMap<Uuid, Vec<Task>>) {
        let before = self.caches.len();
        self.caches
            .retain(|column_id, _| columns.iter().any(|column| column.id == *column_id));
        let removed = before - self.caches.len();

        let mut added = 0;
        for column in columns {
            let cache = self.caches.entry(column.id).or_insert_with(|| {
                added += 1;
                TaskCache::new(Arc::clone(&self.store), column.id)
            });
            cache.seed(tasks.get(&column.id).cloned().unwrap_or_default());
        }

        if added > 0 || removed > 0 {
            tracing::debug!(added, removed, columns = columns.len(), "Task cache registry updated");
        }
    }

    pub fn get(&self, column_id: Uuid) -> Option<&TaskCache> {
        self.caches.get(&column_id)
    }

    pub fn get_mut(&mut self, column_id: Uuid) -> Option<&mut TaskCache> {
        self.caches.get_mut(&column_id)
    }

    pub fn contains(&self, column_id: Uuid) -> bool {
        self.caches.contains_key(&column_id)
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
