use crate::column_type::ColumnType;

/// Which columns a SELECT (or join) projects.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*` — every column of the scanned table(s).
    All,
    /// An explicit list of column names, bare or `table.column` qualified.
    Columns(Vec<String>),
}

/// An ordered sequence of rows produced by a read operation — a table
/// scan, a join, or a filter pass — distinct from any table's stored rows.
///
/// Labels are bare column names for a single-table scan and
/// `table.column` qualified for join output; `types` is positionally
/// aligned so the predicate evaluator can compare cells by declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub types: Vec<ColumnType>,
    pub rows: Vec<Vec<String>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, types: Vec<ColumnType>) -> Self {
        Self {
            columns,
            types,
            rows: Vec::new(),
        }
    }

    /// Resolves a WHERE or projection column reference to a position.
    ///
    /// Resolution order: an exact label match wins; a bare name may also
    /// match exactly one qualified label's `.name` suffix. An ambiguous
    /// bare name (present under several qualifiers) resolves nowhere, as
    /// does a dotted name whose qualified label is absent.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        if let Some(index) = self.columns.iter().position(|c| c == name) {
            return Some(index);
        }
        if name.contains('.') {
            return None;
        }
        let mut found = None;
        for (index, label) in self.columns.iter().enumerate() {
            let suffix_match = label
                .split_once('.')
                .is_some_and(|(_, column)| column == name);
            if suffix_match {
                if found.is_some() {
                    return None;
                }
                found = Some(index);
            }
        }
        found
    }
}
