use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::column_type::ColumnType;
use crate::constraint::{Constraint, ForeignKeyRef};
use crate::database::{Catalog, Database};
use crate::error::DbError;
use crate::table::Table;

/// Writes the whole catalog in the line-oriented text format.
///
/// Per database: its name, then one block per table — the table name, the
/// bracketed column names, types, per-column constraint lists and
/// foreign-key descriptors (`table.column` or empty), then one bracketed
/// line per row — and a `-` sentinel closing the database. Databases and
/// tables are written in name order so the output is stable.
///
/// Cells containing `", "` are outside the format's domain; brackets and
/// separators are not escaped.
pub fn save<W: Write>(catalog: &Catalog, writer: &mut W) -> Result<(), DbError> {
    let mut database_names = catalog.list_databases();
    database_names.sort_unstable();

    for database_name in database_names {
        let Some(database) = catalog.database(database_name) else {
            continue;
        };
        writeln!(writer, "{}", database.name)?;

        let mut table_names = database.list_tables();
        table_names.sort_unstable();
        for table_name in table_names {
            let Some(table) = database.table(table_name) else {
                continue;
            };
            write_table(table, writer)?;
        }
        writeln!(writer, "-")?;
    }
    Ok(())
}

fn write_table<W: Write>(table: &Table, writer: &mut W) -> Result<(), DbError> {
    writeln!(writer, "{}", table.name)?;

    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    writeln!(writer, "[{}]", names.join(", "))?;

    let types: Vec<&str> = table.columns.iter().map(|c| c.column_type.keyword()).collect();
    writeln!(writer, "[{}]", types.join(", "))?;

    let constraints: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let keywords: Vec<&str> = c.constraints.iter().map(|k| k.keyword()).collect();
            format!("[{}]", keywords.join(", "))
        })
        .collect();
    writeln!(writer, "[{}]", constraints.join(", "))?;

    let foreign_keys: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            c.foreign_key
                .as_ref()
                .map(ForeignKeyRef::to_string)
                .unwrap_or_default()
        })
        .collect();
    writeln!(writer, "[{}]", foreign_keys.join(", "))?;

    for row in &table.rows {
        writeln!(writer, "[{}]", row.join(", "))?;
    }
    Ok(())
}

/// Restores a catalog written by [save].
///
/// Foreign keys are taken at face value while loading — a block may
/// reference a table that only appears later in the file — so tables are
/// installed without re-running schema validation.
pub fn load<R: BufRead>(reader: R) -> Result<Catalog, DbError> {
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    let mut catalog = Catalog::new();
    let mut position = 0;

    while position < lines.len() {
        if lines[position].trim().is_empty() {
            position += 1;
            continue;
        }
        let mut database = Database::new(lines[position].as_str());
        position += 1;

        loop {
            let line = lines.get(position).ok_or_else(|| {
                DbError::Corrupt(format!(
                    "database '{}' is missing its closing sentinel",
                    database.name
                ))
            })?;
            if line == "-" {
                position += 1;
                break;
            }
            position = read_table(&lines, position, &mut database)?;
        }
        catalog.restore_database(database);
    }
    Ok(catalog)
}

fn read_table(
    lines: &[String],
    start: usize,
    database: &mut Database,
) -> Result<usize, DbError> {
    let table_name = &lines[start];
    if start + 4 >= lines.len() {
        return Err(DbError::Corrupt(format!(
            "table '{}' is missing its metadata lines",
            table_name
        )));
    }

    let names = parse_list(&lines[start + 1])?;
    let types = parse_list(&lines[start + 2])?
        .iter()
        .map(|keyword| {
            ColumnType::from_keyword(keyword)
                .ok_or_else(|| DbError::Corrupt(format!("unknown column type: {}", keyword)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let constraints = parse_constraint_lists(&lines[start + 3])?;
    let foreign_keys = parse_list(&lines[start + 4])?
        .iter()
        .map(|descriptor| {
            if descriptor.is_empty() {
                Ok(None)
            } else {
                ForeignKeyRef::parse(descriptor)
                    .map(Some)
                    .ok_or_else(|| {
                        DbError::Corrupt(format!("bad foreign key descriptor: {}", descriptor))
                    })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = Table::from_parts(table_name.as_str(), names, types, constraints, foreign_keys)
        .map_err(|err| DbError::Corrupt(err.to_string()))?;

    let mut position = start + 5;
    while position < lines.len() && lines[position].starts_with('[') {
        let row = parse_list(&lines[position])?;
        if row.len() != table.columns.len() {
            return Err(DbError::Corrupt(format!(
                "row arity mismatch in table '{}'",
                table.name
            )));
        }
        table.rows.push(row);
        position += 1;
    }

    database.restore_table(table);
    Ok(position)
}

fn parse_list(line: &str) -> Result<Vec<String>, DbError> {
    let inner = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| DbError::Corrupt(format!("expected a bracketed list: {}", line)))?;
    Ok(inner.split(", ").map(str::to_string).collect())
}

fn parse_constraint_lists(line: &str) -> Result<Vec<Vec<Constraint>>, DbError> {
    let outer = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| DbError::Corrupt(format!("expected a bracketed list: {}", line)))?;
    let inner = outer
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| DbError::Corrupt(format!("expected nested bracketed lists: {}", line)))?;

    inner
        .split("], [")
        .map(|chunk| {
            chunk
                .split(", ")
                .filter(|keyword| !keyword.is_empty())
                .map(|keyword| {
                    Constraint::from_keyword(keyword).ok_or_else(|| {
                        DbError::Corrupt(format!("unknown constraint: {}", keyword))
                    })
                })
                .collect()
        })
        .collect()
}

/// Saves the catalog to a file, creating or truncating it.
pub fn save_to_path(catalog: &Catalog, path: impl AsRef<Path>) -> Result<(), DbError> {
    let mut writer = BufWriter::new(File::create(path)?);
    save(catalog, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Loads a catalog from a file written by [save_to_path].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Catalog, DbError> {
    load(BufReader::new(File::open(path)?))
}
