use std::path::Path;
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::catalog::Catalog;
use crate::common::{DatabaseConfig, Result, TableId, TransactionId};
use crate::execution::SeqScan;
use crate::storage::heap::HeapFile;
use crate::tuple::TupleDesc;

/// One database instance: a catalog and the buffer pool over its tables.
///
/// Instances are independent; tests can run several side by side.
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    config: DatabaseConfig,
}

impl Database {
    /// Creates a database with an empty catalog.
    pub fn new(config: DatabaseConfig) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::from_config(&config, Arc::clone(&catalog)));
        Self {
            catalog,
            buffer_pool,
            config,
        }
    }

    /// Creates a database and loads its tables from a schema file.
    pub fn open<P: AsRef<Path>>(schema_path: P, config: DatabaseConfig) -> Result<Self> {
        let db = Self::new(config);
        db.catalog.load_schema(schema_path)?;
        Ok(db)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Opens (creating if needed) a heap file and registers it as a table.
    pub fn create_table<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        desc: Arc<TupleDesc>,
        primary_key: Option<&str>,
    ) -> Result<TableId> {
        let file = HeapFile::open(path, desc)?;
        Ok(self
            .catalog
            .add_table(file, name, primary_key.map(str::to_string)))
    }

    /// Starts a new transaction.
    pub fn begin(&self) -> TransactionId {
        TransactionId::new()
    }

    /// Ends a transaction, releasing its locks.
    pub fn commit(&self, txn: TransactionId) -> Result<()> {
        self.buffer_pool.transaction_complete(txn, true)
    }

    /// Creates an unaliased scan of the named table.
    pub fn scan(&self, txn: TransactionId, table_name: &str) -> Result<SeqScan> {
        let table_id = self.catalog.table_id(table_name)?;
        SeqScan::new(Arc::clone(&self.buffer_pool), txn, table_id, None)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DatabaseConfig::default())
    }
}
