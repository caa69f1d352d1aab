use std::collections::HashSet;
use std::sync::Mutex;

use graphweave_core::TableCatalog;
use tracing::{trace, warn};

/// Makes relationship tables writable before their first edge.
///
/// The store-side directive is define-if-not-exists, so repeating it is
/// harmless; the per-instance cache only saves round trips. A failed unlock
/// is logged and forgotten: the write that follows will fail on its own and
/// be counted by the caller.
pub struct SchemaUnlocker<'a, C: TableCatalog + ?Sized> {
    catalog: &'a C,
    unlocked: Mutex<HashSet<String>>,
}

impl<'a, C: TableCatalog + ?Sized> SchemaUnlocker<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            unlocked: Mutex::new(HashSet::new()),
        }
    }

    pub async fn ensure_writable(&self, table: &str) {
        if self.is_unlocked(table) {
            trace!(table, "Table already unlocked");
            return;
        }

        match self.catalog.define_open_table(table).await {
            Ok(()) => {
                if let Ok(mut unlocked) = self.unlocked.lock() {
                    unlocked.insert(table.to_string());
                }
            }
            Err(e) => warn!(table, "Failed to unlock table: {}", e),
        }
    }

    fn is_unlocked(&self, table: &str) -> bool {
        self.unlocked
            .lock()
            .map(|unlocked| unlocked.contains(table))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use graphweave_core::{StorageError, StorageResult, TableInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    #[derive(Default)]
    struct CountingCatalog {
        defines: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TableCatalog for CountingCatalog {
        async fn list_tables(&self) -> StorageResult<Vec<TableInfo>> {
            Ok(Vec::new())
        }

        async fn define_open_table(&self, _name: &str) -> StorageResult<()> {
            self.defines.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StorageError::PermissionDenied("no DDL".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn unlocks_each_table_once() {
        let catalog = CountingCatalog::default();
        let unlocker = SchemaUnlocker::new(&catalog);

        unlocker.ensure_writable("WORKS_AT").await;
        unlocker.ensure_writable("WORKS_AT").await;
        unlocker.ensure_writable("NEXT").await;

        assert_eq!(catalog.defines.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_not_cached() {
        let catalog = CountingCatalog {
            fail: true,
            ..Default::default()
        };
        let unlocker = SchemaUnlocker::new(&catalog);

        unlocker.ensure_writable("WORKS_AT").await;
        unlocker.ensure_writable("WORKS_AT").await;

        assert_eq!(catalog.defines.load(Ordering::SeqCst), 2);
        assert!(logs_contain("Failed to unlock table"));
    }
}
