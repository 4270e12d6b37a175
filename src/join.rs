use std::collections::HashSet;

use crate::column_type::ColumnType;
use crate::database::Database;
use crate::error::DbError;
use crate::rowset::{Projection, RowSet};
use crate::table::Table;

/// The four supported join kinds, selected by the query's join keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "INNER" => Some(Self::Inner),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "FULL" => Some(Self::Full),
            _ => None,
        }
    }
}

/// One side of the ON equality condition, written `table.column`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn parse(reference: &str) -> Option<Self> {
        let (table, column) = reference.split_once('.')?;
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some(Self {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}

/// A parsed `<kind> JOIN <table> ON <t1.c1> = <t2.c2>` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub right_table: String,
    pub on_left: ColumnRef,
    pub on_right: ColumnRef,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

struct OutputColumn {
    label: String,
    column_type: ColumnType,
    side: Side,
    index: usize,
}

/// Joins the FROM table with the clause's right table and projects the
/// requested columns into a fresh row set.
///
/// Nested loop over both row vectors; the ON condition is an equality of
/// the two named columns' cell values. Sides without a match contribute
/// empty-string cells. Exactly two tables participate: the ON clause's
/// left operand must name the FROM table and its right operand the JOIN
/// table.
pub fn execute(
    db: &Database,
    from_table: &str,
    clause: &JoinClause,
    projection: &Projection,
) -> Result<RowSet, DbError> {
    if clause.on_left.table != from_table {
        return Err(DbError::Grammar(
            "left table name in the ON clause must match the FROM table".into(),
        ));
    }
    if clause.on_right.table != clause.right_table {
        return Err(DbError::Grammar(
            "right table name in the ON clause must match the JOIN table".into(),
        ));
    }

    let left = db
        .table(from_table)
        .ok_or_else(|| DbError::UnknownTable(from_table.to_string()))?;
    let right = db
        .table(&clause.right_table)
        .ok_or_else(|| DbError::UnknownTable(clause.right_table.clone()))?;

    let left_key = left
        .column_index(&clause.on_left.column)
        .ok_or_else(|| DbError::UnknownColumn {
            table: left.name.clone(),
            column: clause.on_left.column.clone(),
        })?;
    let right_key = right
        .column_index(&clause.on_right.column)
        .ok_or_else(|| DbError::UnknownColumn {
            table: right.name.clone(),
            column: clause.on_right.column.clone(),
        })?;

    let outputs = resolve_projection(left, right, projection)?;
    let mut result = RowSet::new(
        outputs.iter().map(|o| o.label.clone()).collect(),
        outputs.iter().map(|o| o.column_type).collect(),
    );

    let emit = |left_row: Option<&Vec<String>>, right_row: Option<&Vec<String>>| -> Vec<String> {
        outputs
            .iter()
            .map(|output| {
                let source = match output.side {
                    Side::Left => left_row,
                    Side::Right => right_row,
                };
                source.map(|row| row[output.index].clone()).unwrap_or_default()
            })
            .collect()
    };

    match clause.kind {
        JoinKind::Inner | JoinKind::Left => {
            for left_row in &left.rows {
                let mut matched = false;
                for right_row in &right.rows {
                    if left_row[left_key] == right_row[right_key] {
                        result.rows.push(emit(Some(left_row), Some(right_row)));
                        matched = true;
                    }
                }
                if !matched && clause.kind == JoinKind::Left {
                    result.rows.push(emit(Some(left_row), None));
                }
            }
        }
        JoinKind::Right => {
            for right_row in &right.rows {
                let mut matched = false;
                for left_row in &left.rows {
                    if left_row[left_key] == right_row[right_key] {
                        result.rows.push(emit(Some(left_row), Some(right_row)));
                        matched = true;
                    }
                }
                if !matched {
                    result.rows.push(emit(None, Some(right_row)));
                }
            }
        }
        JoinKind::Full => {
            let mut seen: HashSet<Vec<String>> = HashSet::new();
            for left_row in &left.rows {
                let mut matched = false;
                for right_row in &right.rows {
                    if left_row[left_key] == right_row[right_key] {
                        let row = emit(Some(left_row), Some(right_row));
                        if seen.insert(row.clone()) {
                            result.rows.push(row);
                        }
                        matched = true;
                    }
                }
                if !matched {
                    let row = emit(Some(left_row), None);
                    if seen.insert(row.clone()) {
                        result.rows.push(row);
                    }
                }
            }
            for right_row in &right.rows {
                let matched = left
                    .rows
                    .iter()
                    .any(|left_row| left_row[left_key] == right_row[right_key]);
                if !matched {
                    let row = emit(None, Some(right_row));
                    if seen.insert(row.clone()) {
                        result.rows.push(row);
                    }
                }
            }
        }
    }

    Ok(result)
}

/// Maps the requested columns onto the two tables.
///
/// `*` projects every column of both tables in left-then-right order with
/// `table.column` labels. A named column resolves through its qualifier,
/// or bare when exactly one table has it; bare and present in both is
/// ambiguous.
fn resolve_projection(
    left: &Table,
    right: &Table,
    projection: &Projection,
) -> Result<Vec<OutputColumn>, DbError> {
    let mut outputs = Vec::new();
    match projection {
        Projection::All => {
            for (side, table) in [(Side::Left, left), (Side::Right, right)] {
                for (index, column) in table.columns.iter().enumerate() {
                    outputs.push(OutputColumn {
                        label: format!("{}.{}", table.name, column.name),
                        column_type: column.column_type,
                        side,
                        index,
                    });
                }
            }
        }
        Projection::Columns(names) => {
            for name in names {
                outputs.push(resolve_output_column(left, right, name)?);
            }
        }
    }
    Ok(outputs)
}

fn resolve_output_column(
    left: &Table,
    right: &Table,
    name: &str,
) -> Result<OutputColumn, DbError> {
    if let Some((table_name, column_name)) = name.split_once('.') {
        let (side, table) = if table_name == left.name {
            (Side::Left, left)
        } else if table_name == right.name {
            (Side::Right, right)
        } else {
            return Err(DbError::UnknownTable(table_name.to_string()));
        };
        let index = table
            .column_index(column_name)
            .ok_or_else(|| DbError::UnknownColumn {
                table: table.name.clone(),
                column: column_name.to_string(),
            })?;
        return Ok(OutputColumn {
            label: name.to_string(),
            column_type: table.columns[index].column_type,
            side,
            index,
        });
    }

    match (left.column_index(name), right.column_index(name)) {
        (Some(_), Some(_)) => Err(DbError::AmbiguousColumn(name.to_string())),
        (Some(index), None) => Ok(OutputColumn {
            label: name.to_string(),
            column_type: left.columns[index].column_type,
            side: Side::Left,
            index,
        }),
        (None, Some(index)) => Ok(OutputColumn {
            label: name.to_string(),
            column_type: right.columns[index].column_type,
            side: Side::Right,
            index,
        }),
        (None, None) => Err(DbError::UnknownColumn {
            table: format!("{}' or '{}", left.name, right.name),
            column: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::table::ColumnDef;

    fn shop() -> Database {
        let mut db = Database::new("shop");
        db.create_table(Table::new(
            "users",
            vec![
                ColumnDef::new("id", ColumnType::Integer)
                    .with_constraints(vec![Constraint::PrimaryKey]),
                ColumnDef::new("name", ColumnType::Text),
            ],
        ))
        .unwrap();
        db.create_table(Table::new(
            "pets",
            vec![
                ColumnDef::new("id", ColumnType::Integer)
                    .with_constraints(vec![Constraint::PrimaryKey]),
                ColumnDef::new("owner", ColumnType::Integer),
            ],
        ))
        .unwrap();
        db.insert("users", vec!["1".into(), "Ann".into()]).unwrap();
        db.insert("users", vec!["2".into(), "Bo".into()]).unwrap();
        db.insert("pets", vec!["10".into(), "1".into()]).unwrap();
        db
    }

    fn on_users_pets(kind: JoinKind) -> JoinClause {
        JoinClause {
            kind,
            right_table: "pets".into(),
            on_left: ColumnRef::parse("users.id").unwrap(),
            on_right: ColumnRef::parse("pets.owner").unwrap(),
        }
    }

    #[test]
    fn test_inner_join_star() {
        let db = shop();
        let set = execute(&db, "users", &on_users_pets(JoinKind::Inner), &Projection::All)
            .unwrap();

        assert_eq!(
            set.columns,
            vec!["users.id", "users.name", "pets.id", "pets.owner"]
        );
        assert_eq!(set.rows, vec![vec!["1", "Ann", "10", "1"]]);
    }

    #[test]
    fn test_left_join_pads_unmatched_left_rows() {
        let db = shop();
        let set = execute(&db, "users", &on_users_pets(JoinKind::Left), &Projection::All)
            .unwrap();

        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0], vec!["1", "Ann", "10", "1"]);
        assert_eq!(set.rows[1], vec!["2", "Bo", "", ""]);
    }

    #[test]
    fn test_right_join_anchors_on_right_table() {
        let mut db = shop();
        db.insert("pets", vec!["11".into(), "99".into()]).unwrap();

        let set = execute(&db, "users", &on_users_pets(JoinKind::Right), &Projection::All)
            .unwrap();

        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0], vec!["1", "Ann", "10", "1"]);
        assert_eq!(set.rows[1], vec!["", "", "11", "99"]);
    }

    #[test]
    fn test_full_join_unions_and_deduplicates() {
        let mut db = shop();
        db.insert("pets", vec!["11".into(), "99".into()]).unwrap();

        let set = execute(&db, "users", &on_users_pets(JoinKind::Full), &Projection::All)
            .unwrap();

        assert_eq!(set.rows.len(), 3);
        assert!(set.rows.contains(&vec![
            "1".to_string(),
            "Ann".to_string(),
            "10".to_string(),
            "1".to_string()
        ]));
        assert!(set.rows.contains(&vec![
            "2".to_string(),
            "Bo".to_string(),
            String::new(),
            String::new()
        ]));
        assert!(set.rows.contains(&vec![
            String::new(),
            String::new(),
            "11".to_string(),
            "99".to_string()
        ]));
    }

    #[test]
    fn test_projection_qualified_and_bare() {
        let db = shop();
        let projection = Projection::Columns(vec!["users.name".into(), "owner".into()]);
        let set = execute(&db, "users", &on_users_pets(JoinKind::Inner), &projection).unwrap();

        assert_eq!(set.columns, vec!["users.name", "owner"]);
        assert_eq!(set.rows, vec![vec!["Ann", "1"]]);
    }

    #[test]
    fn test_bare_column_in_both_tables_is_ambiguous() {
        let db = shop();
        let projection = Projection::Columns(vec!["id".into()]);
        let err =
            execute(&db, "users", &on_users_pets(JoinKind::Inner), &projection).unwrap_err();
        assert_eq!(err, DbError::AmbiguousColumn("id".into()));
    }

    #[test]
    fn test_on_clause_must_name_the_joined_tables() {
        let db = shop();
        let mut clause = on_users_pets(JoinKind::Inner);
        clause.on_left = ColumnRef::parse("pets.owner").unwrap();

        let err = execute(&db, "users", &clause, &Projection::All).unwrap_err();
        assert!(matches!(err, DbError::Grammar(_)));
    }

    #[test]
    fn test_join_cardinality_matches_pair_count() {
        let mut db = shop();
        // a second pet for Ann: two matching pairs in total
        db.insert("pets", vec!["12".into(), "1".into()]).unwrap();

        let inner = execute(&db, "users", &on_users_pets(JoinKind::Inner), &Projection::All)
            .unwrap();
        assert_eq!(inner.rows.len(), 2);

        let left = execute(&db, "users", &on_users_pets(JoinKind::Left), &Projection::All)
            .unwrap();
        // every matching left row contributes its matches, the unmatched one
        // contributes exactly one padded row
        assert_eq!(left.rows.len(), 3);
    }
}
