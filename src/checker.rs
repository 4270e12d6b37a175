use crate::constraint::{CHECK_ORDER, Constraint};
use crate::database::Database;
use crate::error::DbError;
use crate::table::Table;

/// Validates a candidate row against every column constraint of `table`.
///
/// Pure: nothing is mutated, the first violation found is returned and the
/// caller aborts before touching any row. Constraints are checked per cell
/// in the canonical order NOT_NULL, UNIQUE, PRIMARY_KEY, FOREIGN_KEY; the
/// order decides which violation is reported first, not whether one is
/// found. Foreign keys resolve their referenced table through `db`.
pub fn check_row(db: &Database, table: &Table, row: &[String]) -> Result<(), DbError> {
    for (index, column) in table.columns.iter().enumerate() {
        let cell = &row[index];

        for constraint in CHECK_ORDER {
            if !column.has_constraint(constraint) {
                continue;
            }

            let satisfied = match constraint {
                Constraint::NotNull => !is_null(cell),
                Constraint::Unique => is_unique(cell, table, index),
                Constraint::PrimaryKey => !is_null(cell) && is_unique(cell, table, index),
                Constraint::ForeignKey => is_known_reference(db, table, index, cell)?,
            };

            if !satisfied {
                return Err(DbError::ConstraintViolation {
                    constraint,
                    column: column.name.clone(),
                    value: cell.clone(),
                });
            }
        }
    }
    Ok(())
}

fn is_null(cell: &str) -> bool {
    cell.is_empty()
}

fn is_unique(cell: &str, table: &Table, index: usize) -> bool {
    table.rows.iter().all(|row| row[index] != cell)
}

fn is_known_reference(
    db: &Database,
    table: &Table,
    index: usize,
    cell: &str,
) -> Result<bool, DbError> {
    let column = &table.columns[index];
    let reference = column.foreign_key.as_ref().ok_or_else(|| {
        DbError::InvalidForeignKey(format!(
            "column '{}' declares FOREIGN_KEY but records no target",
            column.name
        ))
    })?;
    let referenced = db
        .table(&reference.table)
        .ok_or_else(|| DbError::UnknownTable(reference.table.clone()))?;
    let referenced_index =
        referenced
            .column_index(&reference.column)
            .ok_or_else(|| DbError::UnknownColumn {
                table: reference.table.clone(),
                column: reference.column.clone(),
            })?;

    Ok(referenced
        .rows
        .iter()
        .any(|row| row[referenced_index] == cell))
}
