use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{DbError, Result, TableId};
use crate::storage::heap::HeapFile;
use crate::tuple::TupleDesc;

use super::parse_schema;

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
    primary_key: Option<String>,
}

#[derive(Default)]
struct CatalogState {
    tables: HashMap<TableId, TableEntry>,
    /// Table name to id; kept in step with `tables`
    names: HashMap<String, TableId>,
}

/// Catalog registers the tables of a database: their heap files, names,
/// schemas and primary keys.
///
/// Names and table ids are both unique. Adding a table under a name that is
/// already taken replaces the older table; re-adding a file under a new name
/// renames it.
#[derive(Default)]
pub struct Catalog {
    state: RwLock<CatalogState>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a heap file as a table and returns its id.
    pub fn add_table(
        &self,
        file: HeapFile,
        name: impl Into<String>,
        primary_key: Option<String>,
    ) -> TableId {
        let name = name.into();
        let table_id = file.table_id();
        let entry = TableEntry {
            file: Arc::new(file),
            name: name.clone(),
            primary_key,
        };

        let mut state = self.state.write();
        if let Some(previous) = state.tables.insert(table_id, entry) {
            if previous.name != name {
                state.names.remove(&previous.name);
            }
        }
        if let Some(older) = state.names.insert(name, table_id) {
            if older != table_id {
                state.tables.remove(&older);
            }
        }
        table_id
    }

    /// Returns the id of the table with the given name.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        self.state
            .read()
            .names
            .get(name)
            .copied()
            .ok_or_else(|| DbError::TableNameNotFound(name.to_string()))
    }

    /// Returns the schema of a table.
    pub fn tuple_desc(&self, table_id: TableId) -> Result<Arc<TupleDesc>> {
        self.with_entry(table_id, |e| e.file.desc().clone())
    }

    /// Returns the heap file backing a table.
    pub fn file(&self, table_id: TableId) -> Result<Arc<HeapFile>> {
        self.with_entry(table_id, |e| Arc::clone(&e.file))
    }

    /// Returns the primary key field name of a table, if it declared one.
    pub fn primary_key(&self, table_id: TableId) -> Result<Option<String>> {
        self.with_entry(table_id, |e| e.primary_key.clone())
    }

    /// Returns the name of a table.
    pub fn table_name(&self, table_id: TableId) -> Result<String> {
        self.with_entry(table_id, |e| e.name.clone())
    }

    /// Returns the ids of all tables, in ascending order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.state.read().tables.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Returns the number of tables.
    pub fn len(&self) -> usize {
        self.state.read().tables.len()
    }

    /// Returns true if no table is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every table.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.tables.clear();
        state.names.clear();
    }

    /// Loads tables from a schema file, in file order.
    ///
    /// Each table's data lives next to the schema file as `<name>.dat`; missing data
    /// files are created empty. Any parse error aborts the load before a table is
    /// added.
    pub fn load_schema<P: AsRef<Path>>(&self, path: P) -> Result<Vec<TableId>> {
        let path = path.as_ref().canonicalize()?;
        let text = fs::read_to_string(&path)?;
        let schemas = parse_schema(&text)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut ids = Vec::with_capacity(schemas.len());
        for schema in schemas {
            let data_path = base_dir.join(format!("{}.dat", schema.name));
            let file = HeapFile::open(data_path, Arc::new(schema.desc))?;
            ids.push(self.add_table(file, schema.name, schema.primary_key));
        }
        Ok(ids)
    }

    fn with_entry<T>(&self, table_id: TableId, f: impl FnOnce(&TableEntry) -> T) -> Result<T> {
        self.state
            .read()
            .tables
            .get(&table_id)
            .map(f)
            .ok_or(DbError::TableNotFound(table_id))
    }
}
