use crate::column_type::ColumnType;
use crate::constraint::{Constraint, ForeignKeyRef};
use crate::error::DbError;
use crate::rowset::RowSet;

/// Column definition in the schema: name, declared type, attached
/// constraints and the optional foreign-key target.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub constraints: Vec<Constraint>,
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            constraints: Vec::new(),
            foreign_key: None,
        }
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyRef) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }

    /// True if the column carries `constraint`.
    pub fn has_constraint(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }

    /// True if the column carries PRIMARY_KEY or UNIQUE. Such columns are
    /// immutable through UPDATE.
    pub fn is_keyed(&self) -> bool {
        self.has_constraint(Constraint::PrimaryKey) || self.has_constraint(Constraint::Unique)
    }
}

/// A named table: an ordered column schema plus the rows admitted so far.
///
/// Every row holds exactly `columns.len()` string-encoded cells; the empty
/// string encodes NULL. The invariant is maintained by the column
/// add/remove operations, which realign every stored row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from the four parallel per-column sequences of the
    /// command grammar.
    ///
    /// # Errors
    /// Fails unless all four sequences have the same length, or when a
    /// column name repeats.
    pub fn from_parts(
        name: impl Into<String>,
        names: Vec<String>,
        types: Vec<ColumnType>,
        constraints: Vec<Vec<Constraint>>,
        foreign_keys: Vec<Option<ForeignKeyRef>>,
    ) -> Result<Self, DbError> {
        let name = name.into();
        if names.len() != types.len()
            || names.len() != constraints.len()
            || names.len() != foreign_keys.len()
        {
            return Err(DbError::Grammar(format!(
                "table '{}' needs equally many column names, types, constraint lists and foreign keys",
                name
            )));
        }
        let mut columns: Vec<ColumnDef> = Vec::with_capacity(names.len());
        for ((column_name, column_type), (constraints, foreign_key)) in names
            .into_iter()
            .zip(types)
            .zip(constraints.into_iter().zip(foreign_keys))
        {
            if columns.iter().any(|c| c.name == column_name) {
                return Err(DbError::DuplicateColumn {
                    table: name,
                    column: column_name,
                });
            }
            columns.push(ColumnDef {
                name: column_name,
                column_type,
                constraints,
                foreign_key,
            });
        }
        Ok(Self::new(name, columns))
    }

    /// Finds the position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Retrieves a column definition by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Appends a column to the schema and an empty cell to every stored row.
    ///
    /// # Errors
    /// Fails if a column with the same name already exists.
    pub fn add_column(&mut self, column: ColumnDef) -> Result<(), DbError> {
        if self.column_index(&column.name).is_some() {
            return Err(DbError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        self.columns.push(column);
        for row in &mut self.rows {
            row.push(String::new());
        }
        Ok(())
    }

    /// Removes a column from the schema together with the cell at its
    /// position in every stored row. Any foreign-key entry at that position
    /// goes with it.
    ///
    /// # Errors
    /// Fails if no column with that name exists.
    pub fn remove_column(&mut self, name: &str) -> Result<(), DbError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| DbError::UnknownColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })?;
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        Ok(())
    }

    /// Produces the full-table row set: bare column labels, declared
    /// types, a copy of every row.
    pub fn scan(&self) -> RowSet {
        RowSet {
            columns: self.columns.iter().map(|c| c.name.clone()).collect(),
            types: self.columns.iter().map(|c| c.column_type).collect(),
            rows: self.rows.clone(),
        }
    }
}
