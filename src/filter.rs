use std::cmp::Ordering;

use crate::compare;
use crate::rowset::RowSet;

/// Comparison operator of one predicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
}

impl CompareOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::NotEq),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            "LIKE" => Some(Self::Like),
            _ => None,
        }
    }
}

/// Logical connector between predicate groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "AND" | "&&" => Some(Self::And),
            "OR" | "||" => Some(Self::Or),
            _ => None,
        }
    }
}

/// One `(column, operator, value)` comparison unit of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: String,
}

/// A full WHERE clause: the first predicate group and every following
/// `(connector, group)` pair, kept flat — there is no precedence and no
/// grouping, the fold below runs strictly left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub first: Condition,
    pub rest: Vec<(Connector, Condition)>,
}

/// Evaluates one predicate group against a candidate row set and returns
/// the matching subset, in candidate order.
///
/// A group whose column does not resolve in the set yields no rows at all;
/// a cell whose numeric comparison is undecidable fails the group for that
/// row only.
pub fn matching_rows(set: &RowSet, condition: &Condition) -> Vec<Vec<String>> {
    let Some(index) = set.resolve(&condition.column) else {
        return Vec::new();
    };
    let column_type = set.types[index];

    set.rows
        .iter()
        .filter(|row| {
            let cell = &row[index];
            match condition.op {
                CompareOp::Like => compare::matches_like(cell, &condition.value),
                op => match compare::compare(cell, &condition.value, column_type) {
                    Some(ordering) => ordering_satisfies(op, ordering),
                    None => false,
                },
            }
        })
        .cloned()
        .collect()
}

fn ordering_satisfies(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Like => false,
    }
}

/// Folds a WHERE clause over a candidate row set.
///
/// Every group is evaluated against the same candidate set; the results are
/// then combined left to right. AND intersects the accumulator with the
/// group result, OR unions them without duplicates — rows compare by full
/// positional value equality in both cases. An empty group result therefore
/// empties the accumulator under AND and leaves it untouched under OR.
pub fn apply(set: &RowSet, clause: &WhereClause) -> Vec<Vec<String>> {
    let mut accumulator = matching_rows(set, &clause.first);

    for (connector, condition) in &clause.rest {
        let group = matching_rows(set, condition);
        match connector {
            Connector::And => accumulator.retain(|row| group.contains(row)),
            Connector::Or => {
                for row in group {
                    if !accumulator.contains(&row) {
                        accumulator.push(row);
                    }
                }
            }
        }
    }

    accumulator
}
