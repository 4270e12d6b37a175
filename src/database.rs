use std::collections::HashMap;

use crate::checker;
use crate::compare;
use crate::constraint::Constraint;
use crate::error::DbError;
use crate::table::{ColumnDef, Table};

/// A named database: the owning registry of its tables and the place where
/// cross-table rules (foreign keys, drop guards) are enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub name: String,
    tables: HashMap<String, Table>,
}

impl Database {
    /// Creates a new, empty database instance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: HashMap::default(),
        }
    }

    /// Retrieves a reference to a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Retrieves a mutable reference to a table by name.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    /// Returns a list of all table names currently stored in the database.
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(|k| k.as_str()).collect()
    }

    /// Iterates over all tables, in no particular order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Adds a table to the database.
    ///
    /// # Errors
    /// Returns an error if a table with the same name already exists, or if
    /// any column's foreign key fails validation (target table or column
    /// missing, type mismatch, or target not UNIQUE/PRIMARY_KEY).
    pub fn create_table(&mut self, table: Table) -> Result<(), DbError> {
        if self.tables.contains_key(&table.name) {
            return Err(DbError::TableExists(table.name));
        }
        for column in &table.columns {
            self.validate_foreign_key(column)?;
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    /// Removes a table from the database by its name.
    ///
    /// # Errors
    /// Returns an error if the table does not exist, or while any other
    /// table's foreign key still points at it.
    pub fn drop_table(&mut self, name: &str) -> Result<(), DbError> {
        if !self.tables.contains_key(name) {
            return Err(DbError::UnknownTable(name.to_string()));
        }
        for other in self.tables.values() {
            if other.name == name {
                continue;
            }
            let references = other
                .columns
                .iter()
                .any(|c| c.foreign_key.as_ref().is_some_and(|fk| fk.table == name));
            if references {
                return Err(DbError::ReferencedByForeignKey {
                    table: name.to_string(),
                    referencing: other.name.clone(),
                });
            }
        }
        self.tables.remove(name);
        Ok(())
    }

    /// Appends a column to an existing table, after validating any foreign
    /// key on it; every stored row grows an empty cell.
    pub fn add_column(&mut self, table_name: &str, column: ColumnDef) -> Result<(), DbError> {
        if !self.tables.contains_key(table_name) {
            return Err(DbError::UnknownTable(table_name.to_string()));
        }
        self.validate_foreign_key(&column)?;
        self.tables
            .get_mut(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?
            .add_column(column)
    }

    /// Removes a column from an existing table; every stored row loses the
    /// cell at that position.
    pub fn remove_column(&mut self, table_name: &str, column_name: &str) -> Result<(), DbError> {
        self.tables
            .get_mut(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?
            .remove_column(column_name)
    }

    /// Inserts one row: arity check, constraint check, type validation,
    /// and only if all of them pass, the append.
    ///
    /// # Errors
    /// Any failed check aborts the insert with the table unchanged.
    pub fn insert(&mut self, table_name: &str, values: Vec<String>) -> Result<(), DbError> {
        let table = self
            .table(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;

        if values.len() != table.columns.len() {
            return Err(DbError::ColumnCountMismatch {
                table: table.name.clone(),
                expected: table.columns.len(),
                got: values.len(),
            });
        }

        checker::check_row(self, table, &values)?;

        for (cell, column) in values.iter().zip(&table.columns) {
            if !compare::is_valid_cell(cell, column.column_type) {
                return Err(DbError::TypeValidation {
                    value: cell.clone(),
                    column: column.name.clone(),
                    expected: column.column_type,
                });
            }
        }

        self.tables
            .get_mut(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?
            .rows
            .push(values);
        Ok(())
    }

    /// Overwrites the assigned cells in every row of the target set, or in
    /// every row of the table when `targets` is `None`. Target rows match
    /// by full positional value equality.
    ///
    /// Every assignment is validated before anything is written: the column
    /// must exist (fatal otherwise), the new value must pass type
    /// validation, and the column must not carry PRIMARY_KEY or UNIQUE —
    /// key columns are immutable through UPDATE in this engine.
    ///
    /// Returns the number of rows written.
    pub fn update(
        &mut self,
        table_name: &str,
        assignments: &[(String, String)],
        targets: Option<&[Vec<String>]>,
    ) -> Result<usize, DbError> {
        let table = self
            .table(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;

        let mut plan = Vec::with_capacity(assignments.len());
        for (column_name, value) in assignments {
            let index = table
                .column_index(column_name)
                .ok_or_else(|| DbError::UnknownColumn {
                    table: table.name.clone(),
                    column: column_name.clone(),
                })?;
            let column = &table.columns[index];
            if !compare::is_valid_cell(value, column.column_type) {
                return Err(DbError::TypeValidation {
                    value: value.clone(),
                    column: column.name.clone(),
                    expected: column.column_type,
                });
            }
            if column.is_keyed() {
                return Err(DbError::ImmutableColumn(column.name.clone()));
            }
            plan.push((index, value.clone()));
        }

        let table = self
            .tables
            .get_mut(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;
        let mut written = 0;
        for row in &mut table.rows {
            if targets.map_or(true, |t| t.contains(row)) {
                for (index, value) in &plan {
                    row[*index] = value.clone();
                }
                written += 1;
            }
        }
        Ok(written)
    }

    /// Removes every row equal (full positional value equality) to a row
    /// of the target set, or every row when `targets` is `None`. Returns
    /// the number of rows removed.
    pub fn delete(
        &mut self,
        table_name: &str,
        targets: Option<&[Vec<String>]>,
    ) -> Result<usize, DbError> {
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;
        let before = table.rows.len();
        match targets {
            None => table.rows.clear(),
            Some(targets) => table.rows.retain(|row| !targets.contains(row)),
        }
        Ok(before - table.rows.len())
    }

    /// Inserts a table as restored from disk, bypassing foreign-key
    /// validation — a loaded block may reference a table that only appears
    /// later in the file.
    pub(crate) fn restore_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    fn validate_foreign_key(&self, column: &ColumnDef) -> Result<(), DbError> {
        if column.has_constraint(Constraint::ForeignKey) && column.foreign_key.is_none() {
            return Err(DbError::InvalidForeignKey(format!(
                "column '{}' declares FOREIGN_KEY but names no target",
                column.name
            )));
        }
        let Some(reference) = &column.foreign_key else {
            return Ok(());
        };

        let referenced = self.table(&reference.table).ok_or_else(|| {
            DbError::InvalidForeignKey(format!(
                "referenced table '{}' does not exist",
                reference.table
            ))
        })?;
        let target = referenced.column(&reference.column).ok_or_else(|| {
            DbError::InvalidForeignKey(format!(
                "referenced column '{}' does not exist in table '{}'",
                reference.column, reference.table
            ))
        })?;
        if target.column_type != column.column_type {
            return Err(DbError::InvalidForeignKey(format!(
                "column '{}' is {} but '{}' is {}",
                column.name, column.column_type, reference, target.column_type
            )));
        }
        if !target.is_keyed() {
            return Err(DbError::InvalidForeignKey(format!(
                "referenced column '{}' must carry UNIQUE or PRIMARY_KEY",
                reference
            )));
        }
        Ok(())
    }
}

/// The process-wide registry of databases, held explicitly by the session
/// instead of living in global state. Entries are created, looked up and
/// dropped only through these methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    databases: HashMap<String, Database>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new, empty database.
    ///
    /// # Errors
    /// Returns an error if the name is already taken.
    pub fn create_database(&mut self, name: &str) -> Result<(), DbError> {
        if self.databases.contains_key(name) {
            return Err(DbError::DatabaseExists(name.to_string()));
        }
        self.databases
            .insert(name.to_string(), Database::new(name));
        Ok(())
    }

    /// Unregisters a database and everything it owns.
    pub fn drop_database(&mut self, name: &str) -> Result<(), DbError> {
        match self.databases.remove(name) {
            Some(_) => Ok(()),
            None => Err(DbError::UnknownDatabase(name.to_string())),
        }
    }

    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.get(name)
    }

    pub fn database_mut(&mut self, name: &str) -> Option<&mut Database> {
        self.databases.get_mut(name)
    }

    pub fn list_databases(&self) -> Vec<&str> {
        self.databases.keys().map(|k| k.as_str()).collect()
    }

    pub(crate) fn restore_database(&mut self, database: Database) {
        self.databases.insert(database.name.clone(), database);
    }
}
