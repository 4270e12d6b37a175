use std::fmt;

/// A rule attached to a column, enforced when rows are admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// The cell must be non-empty.
    NotNull,
    /// No existing row may hold an equal value in this column.
    Unique,
    /// NOT_NULL and UNIQUE combined.
    PrimaryKey,
    /// The cell must equal a value currently present in the referenced
    /// column of the referenced table.
    ForeignKey,
}

/// Canonical evaluation order for constraint checks. The outcome does not
/// depend on it, but the first violation reported does.
pub const CHECK_ORDER: [Constraint; 4] = [
    Constraint::NotNull,
    Constraint::Unique,
    Constraint::PrimaryKey,
    Constraint::ForeignKey,
];

impl Constraint {
    /// Parses a grammar keyword into a constraint.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "NOT_NULL" => Some(Self::NotNull),
            "UNIQUE" => Some(Self::Unique),
            "PRIMARY_KEY" => Some(Self::PrimaryKey),
            "FOREIGN_KEY" => Some(Self::ForeignKey),
            _ => None,
        }
    }

    /// Returns the grammar keyword for this constraint.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::NotNull => "NOT_NULL",
            Self::Unique => "UNIQUE",
            Self::PrimaryKey => "PRIMARY_KEY",
            Self::ForeignKey => "FOREIGN_KEY",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A named handle to a column in another table of the same database.
///
/// The referenced table is resolved through the owning [Database] at use
/// time, never held as a pointer, so dropping tables cannot leave a
/// dangling reference behind.
///
/// [Database]: crate::database::Database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl ForeignKeyRef {
    /// Parses a `table.column` descriptor.
    pub fn parse(descriptor: &str) -> Option<Self> {
        let (table, column) = descriptor.split_once('.')?;
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some(Self {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_keywords() {
        assert_eq!(
            Constraint::from_keyword("PRIMARY_KEY"),
            Some(Constraint::PrimaryKey)
        );
        assert_eq!(Constraint::from_keyword("NOT_NULL"), Some(Constraint::NotNull));
        assert_eq!(Constraint::from_keyword("PRIMARY KEY"), None);
        for c in CHECK_ORDER {
            assert_eq!(Constraint::from_keyword(c.keyword()), Some(c));
        }
    }

    #[test]
    fn test_foreign_key_ref_parse() {
        let fk = ForeignKeyRef::parse("users.id").unwrap();
        assert_eq!(fk.table, "users");
        assert_eq!(fk.column, "id");
        assert_eq!(fk.to_string(), "users.id");

        assert!(ForeignKeyRef::parse("users").is_none());
        assert!(ForeignKeyRef::parse(".id").is_none());
        assert!(ForeignKeyRef::parse("users.").is_none());
    }
}
