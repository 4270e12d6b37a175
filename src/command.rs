use std::path::PathBuf;

use crate::column_type::ColumnType;
use crate::constraint::{Constraint, ForeignKeyRef};
use crate::database::{Catalog, Database};
use crate::error::DbError;
use crate::filter::{self, CompareOp, Condition, Connector, WhereClause};
use crate::join::{self, ColumnRef, JoinClause, JoinKind};
use crate::rowset::{Projection, RowSet};
use crate::storage;
use crate::table::{ColumnDef, Table};

/// A fully classified command, one variant per operation of the grammar.
///
/// Produced from a whitespace-tokenized query by [Command::parse]; every
/// variant carries its already-validated fields, so execution never looks
/// back at raw tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateDatabase(String),
    UseDatabase(String),
    DropDatabase(String),
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
    },
    DropTable(String),
    AddColumn {
        table: String,
        column: ColumnDef,
    },
    DropColumn {
        table: String,
        column: String,
    },
    Insert {
        table: String,
        values: Vec<String>,
    },
    Select {
        projection: Projection,
        tables: Vec<String>,
        join: Option<JoinClause>,
        filter: Option<WhereClause>,
    },
    Update {
        table: String,
        assignments: Vec<(String, String)>,
        filter: Option<WhereClause>,
    },
    Delete {
        table: String,
        filter: Option<WhereClause>,
    },
    Save,
}

impl Command {
    /// Classifies a tokenized query. Tokens arrive whitespace-split from
    /// the caller; single-quoted values spanning several tokens are
    /// re-joined here.
    pub fn parse(tokens: &[String]) -> Result<Self, DbError> {
        let Some(keyword) = tokens.first() else {
            return Err(DbError::Grammar("empty query".into()));
        };
        match keyword.as_str() {
            "DATABASE" => parse_database(tokens),
            "TABLE" => parse_table(tokens),
            "ALTER" => parse_alter(tokens),
            "INSERT" => parse_insert(tokens),
            "SELECT" => parse_select(tokens),
            "UPDATE" => parse_update(tokens),
            "DELETE" => parse_delete(tokens),
            "SAVE" => Ok(Command::Save),
            other => Err(DbError::Grammar(format!("unknown command: {}", other))),
        }
    }
}

fn find_index(tokens: &[String], keyword: &str) -> Option<usize> {
    tokens.iter().position(|t| t == keyword)
}

fn strip_comma(token: &str) -> &str {
    token.strip_suffix(',').unwrap_or(token)
}

/// Removes the surrounding single quotes of a value token, if any.
fn unquote(token: &str) -> String {
    if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
        token[1..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

fn parse_database(tokens: &[String]) -> Result<Command, DbError> {
    let (Some(operation), Some(name)) = (tokens.get(1), tokens.get(2)) else {
        return Err(DbError::Grammar(
            "DATABASE queries take an operation and a name".into(),
        ));
    };
    match operation.as_str() {
        "CREATE" => Ok(Command::CreateDatabase(name.clone())),
        "USE" => Ok(Command::UseDatabase(name.clone())),
        "DROP" => Ok(Command::DropDatabase(name.clone())),
        _ => Err(DbError::Grammar(
            "DATABASE queries support CREATE, USE and DROP".into(),
        )),
    }
}

fn parse_table(tokens: &[String]) -> Result<Command, DbError> {
    match tokens.get(1).map(String::as_str) {
        Some("CREATE") => {
            let name = tokens
                .get(2)
                .ok_or_else(|| DbError::Grammar("TABLE CREATE needs a table name".into()))?;
            if tokens.get(3).map(String::as_str) != Some("WITH")
                || tokens.get(4).map(String::as_str) != Some("COLUMNS")
            {
                return Err(DbError::Grammar(
                    "TABLE CREATE needs WITH COLUMNS after the table name".into(),
                ));
            }
            let specs = &tokens[5..];
            if specs.is_empty() {
                return Err(DbError::Grammar(
                    "TABLE CREATE names no columns".into(),
                ));
            }
            let mut columns = Vec::with_capacity(specs.len());
            for spec in specs {
                columns.push(parse_column_spec(strip_comma(spec))?);
            }
            Ok(Command::CreateTable {
                name: name.clone(),
                columns,
            })
        }
        Some("DROP") => {
            let name = tokens
                .get(2)
                .ok_or_else(|| DbError::Grammar("TABLE DROP needs a table name".into()))?;
            Ok(Command::DropTable(name.clone()))
        }
        _ => Err(DbError::Grammar(
            "TABLE queries support CREATE and DROP".into(),
        )),
    }
}

/// Parses one `name(TYPE)[CONSTRAINT,...]{table.column}` column spec.
/// The constraint list and the foreign-key braces are optional.
fn parse_column_spec(spec: &str) -> Result<ColumnDef, DbError> {
    let open = spec
        .find('(')
        .ok_or_else(|| DbError::Grammar(format!("column spec '{}' declares no type", spec)))?;
    let close = spec
        .find(')')
        .filter(|close| *close > open)
        .ok_or_else(|| DbError::Grammar(format!("column spec '{}' declares no type", spec)))?;

    let name = &spec[..open];
    if name.is_empty() {
        return Err(DbError::Grammar(format!(
            "column spec '{}' declares no name",
            spec
        )));
    }

    let type_keyword = &spec[open + 1..close];
    let column_type = ColumnType::from_keyword(type_keyword)
        .ok_or_else(|| DbError::Grammar(format!("invalid column type: {}", type_keyword)))?;

    let mut constraints = Vec::new();
    if let (Some(open), Some(close)) = (spec.find('['), spec.find(']')) {
        for keyword in spec[open + 1..close].split(',').filter(|k| !k.is_empty()) {
            let constraint = Constraint::from_keyword(keyword)
                .ok_or_else(|| DbError::Grammar(format!("invalid constraint: {}", keyword)))?;
            constraints.push(constraint);
        }
    }

    let mut foreign_key = None;
    if let (Some(open), Some(close)) = (spec.find('{'), spec.find('}')) {
        let descriptor = &spec[open + 1..close];
        if !descriptor.is_empty() {
            foreign_key = Some(ForeignKeyRef::parse(descriptor).ok_or_else(|| {
                DbError::Grammar(format!(
                    "foreign key '{}' must be written table.column",
                    descriptor
                ))
            })?);
        }
    }

    Ok(ColumnDef {
        name: name.to_string(),
        column_type,
        constraints,
        foreign_key,
    })
}

fn parse_alter(tokens: &[String]) -> Result<Command, DbError> {
    if tokens.get(1).map(String::as_str) != Some("TABLE") {
        return Err(DbError::Grammar(
            "ALTER queries need a TABLE clause".into(),
        ));
    }
    let table = tokens
        .get(2)
        .ok_or_else(|| DbError::Grammar("ALTER TABLE needs a table name".into()))?;
    if tokens.get(4).map(String::as_str) != Some("COLUMN") {
        return Err(DbError::Grammar(
            "ALTER TABLE needs ADD COLUMN or DROP COLUMN".into(),
        ));
    }
    let operand = tokens
        .get(5)
        .ok_or_else(|| DbError::Grammar("ALTER TABLE names no column".into()))?;

    match tokens.get(3).map(String::as_str) {
        Some("ADD") => Ok(Command::AddColumn {
            table: table.clone(),
            column: parse_column_spec(operand)?,
        }),
        Some("DROP") => Ok(Command::DropColumn {
            table: table.clone(),
            column: operand.clone(),
        }),
        _ => Err(DbError::Grammar(
            "ALTER TABLE needs ADD COLUMN or DROP COLUMN".into(),
        )),
    }
}

fn parse_insert(tokens: &[String]) -> Result<Command, DbError> {
    if tokens.get(1).map(String::as_str) != Some("INTO") {
        return Err(DbError::Grammar(
            "INSERT queries need an INTO clause".into(),
        ));
    }
    let table = tokens
        .get(2)
        .ok_or_else(|| DbError::Grammar("INSERT INTO needs a table name".into()))?;
    let values_index = find_index(tokens, "VALUES")
        .ok_or_else(|| DbError::Grammar("INSERT queries need a VALUES clause".into()))?;

    Ok(Command::Insert {
        table: table.clone(),
        values: clean_values(&tokens[values_index + 1..])?,
    })
}

/// Normalizes the VALUES token list: separator commas go, surrounding
/// quotes go, and a single-quoted value split over several tokens is
/// re-joined with the spaces it was tokenized on.
fn clean_values(tokens: &[String]) -> Result<Vec<String>, DbError> {
    let mut values = Vec::new();
    let mut pending = String::new();

    for raw in tokens {
        if !pending.is_empty() {
            pending.push(' ');
            pending.push_str(raw);
            let joined = strip_comma(&pending);
            if joined.len() >= 2 && joined.ends_with('\'') {
                values.push(joined[1..joined.len() - 1].to_string());
                pending.clear();
            }
            continue;
        }

        let token = strip_comma(raw);
        if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
            values.push(token[1..token.len() - 1].to_string());
        } else if token.starts_with('\'') {
            // keep the raw token, an inner comma belongs to the value
            pending = raw.clone();
        } else {
            values.push(token.replace(',', ""));
        }
    }

    if !pending.is_empty() {
        return Err(DbError::Grammar("unterminated quoted value".into()));
    }
    Ok(values)
}

fn parse_where(tokens: &[String]) -> Result<WhereClause, DbError> {
    let mut conditions = Vec::new();
    let mut connectors = Vec::new();
    let mut index = 0;

    loop {
        let (Some(column), Some(operator), Some(value)) = (
            tokens.get(index),
            tokens.get(index + 1),
            tokens.get(index + 2),
        ) else {
            return Err(DbError::Grammar(
                "WHERE clause needs column, operator and value".into(),
            ));
        };
        let op = CompareOp::from_token(operator)
            .ok_or_else(|| DbError::Grammar(format!("unknown comparison operator: {}", operator)))?;
        conditions.push(Condition {
            column: column.clone(),
            op,
            value: unquote(value),
        });

        match tokens.get(index + 3) {
            None => break,
            Some(connector) => {
                let connector = Connector::from_token(connector).ok_or_else(|| {
                    DbError::Grammar(format!("expected AND or OR, found: {}", connector))
                })?;
                connectors.push(connector);
                index += 4;
            }
        }
    }

    let mut groups = conditions.into_iter();
    let first = groups
        .next()
        .ok_or_else(|| DbError::Grammar("WHERE clause is empty".into()))?;
    Ok(WhereClause {
        first,
        rest: connectors.into_iter().zip(groups).collect(),
    })
}

fn parse_select(tokens: &[String]) -> Result<Command, DbError> {
    let from_index = find_index(tokens, "FROM")
        .ok_or_else(|| DbError::Grammar("SELECT queries need a FROM clause".into()))?;
    if from_index < 2 {
        return Err(DbError::Grammar("SELECT names no columns".into()));
    }

    let column_tokens: Vec<String> = tokens[1..from_index]
        .iter()
        .map(|t| strip_comma(t).to_string())
        .collect();
    let projection = if column_tokens.len() == 1 && column_tokens[0] == "*" {
        Projection::All
    } else {
        Projection::Columns(column_tokens)
    };

    let where_index = find_index(tokens, "WHERE");
    // only look for a join keyword ahead of the WHERE clause, a filter
    // value may spell LEFT or FULL
    let join_search_end = where_index.unwrap_or(tokens.len());
    let join_kind_index = tokens[..join_search_end]
        .iter()
        .position(|t| JoinKind::from_token(t).is_some());

    let (tables, join) = match join_kind_index {
        Some(kind_index) => {
            let kind = JoinKind::from_token(&tokens[kind_index]).ok_or_else(|| {
                DbError::Grammar("join queries need INNER, LEFT, RIGHT or FULL".into())
            })?;
            if tokens.get(kind_index + 1).map(String::as_str) != Some("JOIN")
                || tokens.get(kind_index + 3).map(String::as_str) != Some("ON")
            {
                return Err(DbError::Grammar(
                    "join queries need JOIN and ON clauses after the join kind".into(),
                ));
            }
            if tokens.get(kind_index + 5).map(String::as_str) != Some("=") {
                return Err(DbError::Grammar(
                    "the ON clause joins on an equality condition".into(),
                ));
            }
            let (Some(right_table), Some(on_left), Some(on_right)) = (
                tokens.get(kind_index + 2),
                tokens.get(kind_index + 4),
                tokens.get(kind_index + 6),
            ) else {
                return Err(DbError::Grammar("incomplete join clause".into()));
            };

            let tables: Vec<String> = tokens[from_index + 1..kind_index]
                .iter()
                .map(|t| strip_comma(t).to_string())
                .collect();
            if tables.len() != 1 {
                return Err(DbError::Grammar(
                    "join queries take exactly one FROM table".into(),
                ));
            }
            if let Some(where_index) = where_index {
                if where_index < kind_index + 6 {
                    return Err(DbError::Grammar(
                        "the WHERE clause must follow the join clause".into(),
                    ));
                }
            }

            let on_left = ColumnRef::parse(on_left).ok_or_else(|| {
                DbError::Grammar("ON operands must be written table.column".into())
            })?;
            let on_right = ColumnRef::parse(on_right).ok_or_else(|| {
                DbError::Grammar("ON operands must be written table.column".into())
            })?;
            let join = JoinClause {
                kind,
                right_table: right_table.clone(),
                on_left,
                on_right,
            };
            (tables, Some(join))
        }
        None => {
            let end = where_index.unwrap_or(tokens.len());
            let tables: Vec<String> = tokens[from_index + 1..end]
                .iter()
                .map(|t| strip_comma(t).to_string())
                .collect();
            if tables.is_empty() {
                return Err(DbError::Grammar("FROM clause names no table".into()));
            }
            (tables, None)
        }
    };

    let filter = match where_index {
        Some(where_index) => Some(parse_where(&tokens[where_index + 1..])?),
        None => None,
    };

    Ok(Command::Select {
        projection,
        tables,
        join,
        filter,
    })
}

fn parse_update(tokens: &[String]) -> Result<Command, DbError> {
    let table = tokens
        .get(1)
        .ok_or_else(|| DbError::Grammar("UPDATE needs a table name".into()))?;
    if tokens.get(2).map(String::as_str) != Some("SET") {
        return Err(DbError::Grammar(
            "UPDATE queries need a SET clause after the table name".into(),
        ));
    }

    let where_index = find_index(tokens, "WHERE");
    let stop = where_index.unwrap_or(tokens.len());

    let mut assignments = Vec::new();
    let mut index = 3;
    while index < stop {
        let (Some(column), Some(equals), Some(value)) = (
            tokens.get(index),
            tokens.get(index + 1),
            tokens.get(index + 2).filter(|_| index + 2 < stop),
        ) else {
            return Err(DbError::Grammar(
                "SET clause needs column = value pairs".into(),
            ));
        };
        if equals != "=" {
            return Err(DbError::Grammar(
                "SET clause needs column = value pairs".into(),
            ));
        }
        assignments.push((column.clone(), unquote(strip_comma(value))));
        index += 3;
    }
    if assignments.is_empty() {
        return Err(DbError::Grammar("SET clause assigns nothing".into()));
    }

    let filter = match where_index {
        Some(where_index) => Some(parse_where(&tokens[where_index + 1..])?),
        None => None,
    };

    Ok(Command::Update {
        table: table.clone(),
        assignments,
        filter,
    })
}

fn parse_delete(tokens: &[String]) -> Result<Command, DbError> {
    if tokens.get(1).map(String::as_str) != Some("FROM") {
        return Err(DbError::Grammar(
            "DELETE queries need a FROM clause".into(),
        ));
    }
    let table = tokens
        .get(2)
        .ok_or_else(|| DbError::Grammar("DELETE FROM needs a table name".into()))?;

    let filter = if tokens.len() > 3 {
        if tokens.get(3).map(String::as_str) != Some("WHERE") {
            return Err(DbError::Grammar(
                "DELETE queries take a WHERE clause after the table name".into(),
            ));
        }
        Some(parse_where(&tokens[4..])?)
    } else {
        None
    };

    Ok(Command::Delete {
        table: table.clone(),
        filter,
    })
}

/// A query-processing session: owns the catalog, tracks the selected
/// database, executes commands one at a time.
///
/// Every statement is all-or-nothing; a failed one reports its error and
/// leaves all state from before the call unchanged, ready for the next
/// query.
pub struct Session {
    catalog: Catalog,
    current: Option<String>,
    save_path: PathBuf,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_catalog(Catalog::new())
    }

    /// Starts a session over an existing catalog, e.g. one restored from
    /// disk.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            current: None,
            save_path: PathBuf::from("data.txt"),
        }
    }

    /// Where the SAVE command writes the catalog.
    pub fn set_save_path(&mut self, path: impl Into<PathBuf>) {
        self.save_path = path.into();
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current_database(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Parses and runs one tokenized query.
    ///
    /// SELECT returns its row set; every other command returns `None`.
    ///
    /// # Example
    /// ```
    /// use minidb::Session;
    ///
    /// fn toks(query: &str) -> Vec<String> {
    ///     query.split_whitespace().map(str::to_string).collect()
    /// }
    ///
    /// let mut session = Session::new();
    /// session.execute(&toks("DATABASE CREATE shop")).unwrap();
    /// session.execute(&toks("DATABASE USE shop")).unwrap();
    /// session
    ///     .execute(&toks("TABLE CREATE users WITH COLUMNS id(INTEGER)[PRIMARY_KEY], name(TEXT)"))
    ///     .unwrap();
    /// session.execute(&toks("INSERT INTO users VALUES 1, 'Ann'")).unwrap();
    ///
    /// let rows = session.execute(&toks("SELECT * FROM users")).unwrap().unwrap();
    /// assert_eq!(rows.rows, vec![vec!["1".to_string(), "Ann".to_string()]]);
    /// ```
    pub fn execute(&mut self, tokens: &[String]) -> Result<Option<RowSet>, DbError> {
        let command = Command::parse(tokens)?;
        self.run(command)
    }

    /// Runs an already-parsed command.
    pub fn run(&mut self, command: Command) -> Result<Option<RowSet>, DbError> {
        match command {
            Command::CreateDatabase(name) => {
                self.catalog.create_database(&name)?;
                Ok(None)
            }
            Command::UseDatabase(name) => {
                if self.catalog.database(&name).is_none() {
                    return Err(DbError::UnknownDatabase(name));
                }
                self.current = Some(name);
                Ok(None)
            }
            Command::DropDatabase(name) => {
                self.catalog.drop_database(&name)?;
                if self.current.as_deref() == Some(name.as_str()) {
                    self.current = None;
                }
                Ok(None)
            }
            Command::CreateTable { name, columns } => {
                self.database_mut()?.create_table(Table::new(name, columns))?;
                Ok(None)
            }
            Command::DropTable(name) => {
                self.database_mut()?.drop_table(&name)?;
                Ok(None)
            }
            Command::AddColumn { table, column } => {
                self.database_mut()?.add_column(&table, column)?;
                Ok(None)
            }
            Command::DropColumn { table, column } => {
                self.database_mut()?.remove_column(&table, &column)?;
                Ok(None)
            }
            Command::Insert { table, values } => {
                self.database_mut()?.insert(&table, values)?;
                Ok(None)
            }
            Command::Select {
                projection,
                tables,
                join,
                filter,
            } => self
                .select(&projection, &tables, join.as_ref(), filter.as_ref())
                .map(Some),
            Command::Update {
                table,
                assignments,
                filter,
            } => {
                let targets = self.filter_targets(&table, filter.as_ref())?;
                self.database_mut()?
                    .update(&table, &assignments, targets.as_deref())?;
                Ok(None)
            }
            Command::Delete { table, filter } => {
                let targets = self.filter_targets(&table, filter.as_ref())?;
                self.database_mut()?.delete(&table, targets.as_deref())?;
                Ok(None)
            }
            Command::Save => {
                storage::save_to_path(&self.catalog, &self.save_path)?;
                Ok(None)
            }
        }
    }

    fn database(&self) -> Result<&Database, DbError> {
        let name = self.current.as_deref().ok_or(DbError::NoDatabaseSelected)?;
        self.catalog
            .database(name)
            .ok_or_else(|| DbError::UnknownDatabase(name.to_string()))
    }

    fn database_mut(&mut self) -> Result<&mut Database, DbError> {
        let name = self
            .current
            .clone()
            .ok_or(DbError::NoDatabaseSelected)?;
        self.catalog
            .database_mut(&name)
            .ok_or(DbError::UnknownDatabase(name))
    }

    /// Evaluates a WHERE clause over a full-table scan into the mutation
    /// target set. `None` means the whole table.
    fn filter_targets(
        &self,
        table_name: &str,
        filter: Option<&WhereClause>,
    ) -> Result<Option<Vec<Vec<String>>>, DbError> {
        let Some(clause) = filter else {
            return Ok(None);
        };
        let db = self.database()?;
        let table = db
            .table(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;
        Ok(Some(filter::apply(&table.scan(), clause)))
    }

    fn select(
        &self,
        projection: &Projection,
        tables: &[String],
        join: Option<&JoinClause>,
        filter: Option<&WhereClause>,
    ) -> Result<RowSet, DbError> {
        let db = self.database()?;

        if let Some(clause) = join {
            let mut set = join::execute(db, &tables[0], clause, projection)?;
            if let Some(where_clause) = filter {
                set.rows = filter::apply(&set, where_clause);
            }
            return Ok(set);
        }

        // scan, filter and project every FROM table independently,
        // concatenating the results in FROM order
        let mut output: Option<RowSet> = None;
        for table_name in tables {
            let table = db
                .table(table_name)
                .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;
            let scan = table.scan();
            let rows = match filter {
                Some(where_clause) => filter::apply(&scan, where_clause),
                None => scan.rows.clone(),
            };
            let projected = project(table_name, &scan, rows, projection)?;
            match &mut output {
                None => output = Some(projected),
                Some(set) => set.rows.extend(projected.rows),
            }
        }
        output.ok_or_else(|| DbError::Grammar("FROM clause names no table".into()))
    }
}

fn project(
    table_name: &str,
    scan: &RowSet,
    rows: Vec<Vec<String>>,
    projection: &Projection,
) -> Result<RowSet, DbError> {
    match projection {
        Projection::All => Ok(RowSet {
            columns: scan.columns.clone(),
            types: scan.types.clone(),
            rows,
        }),
        Projection::Columns(names) => {
            let mut indices = Vec::with_capacity(names.len());
            for name in names {
                let index = scan.resolve(name).ok_or_else(|| DbError::UnknownColumn {
                    table: table_name.to_string(),
                    column: name.clone(),
                })?;
                indices.push(index);
            }
            Ok(RowSet {
                columns: names.clone(),
                types: indices.iter().map(|&i| scan.types[i]).collect(),
                rows: rows
                    .into_iter()
                    .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                    .collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(query: &str) -> Vec<String> {
        query.split_whitespace().map(str::to_string).collect()
    }

    fn shop_session() -> Session {
        let mut session = Session::new();
        session.execute(&toks("DATABASE CREATE shop")).unwrap();
        session.execute(&toks("DATABASE USE shop")).unwrap();
        session
            .execute(&toks(
                "TABLE CREATE users WITH COLUMNS id(INTEGER)[PRIMARY_KEY], name(TEXT)[NOT_NULL]",
            ))
            .unwrap();
        session
            .execute(&toks("INSERT INTO users VALUES 1, 'Ann'"))
            .unwrap();
        session
            .execute(&toks("INSERT INTO users VALUES 2, 'Bo'"))
            .unwrap();
        session
    }

    #[test]
    fn test_parse_database_commands() {
        assert_eq!(
            Command::parse(&toks("DATABASE CREATE shop")).unwrap(),
            Command::CreateDatabase("shop".into())
        );
        assert_eq!(
            Command::parse(&toks("DATABASE USE shop")).unwrap(),
            Command::UseDatabase("shop".into())
        );
        assert!(Command::parse(&toks("DATABASE MAKE shop")).is_err());
        assert!(Command::parse(&toks("DATABASE CREATE")).is_err());
    }

    #[test]
    fn test_parse_create_table_specs() {
        let command = Command::parse(&toks(
            "TABLE CREATE pets WITH COLUMNS id(INTEGER)[PRIMARY_KEY], owner(INTEGER)[NOT_NULL,FOREIGN_KEY]{users.id}, note(TEXT)",
        ))
        .unwrap();

        let Command::CreateTable { name, columns } = command else {
            panic!("expected CreateTable");
        };
        assert_eq!(name, "pets");
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].constraints, vec![Constraint::PrimaryKey]);
        assert_eq!(
            columns[1].constraints,
            vec![Constraint::NotNull, Constraint::ForeignKey]
        );
        assert_eq!(columns[1].foreign_key.as_ref().unwrap().to_string(), "users.id");
        assert!(columns[2].constraints.is_empty());
        assert!(columns[2].foreign_key.is_none());
    }

    #[test]
    fn test_parse_bad_column_specs() {
        assert!(Command::parse(&toks("TABLE CREATE t WITH COLUMNS id")).is_err());
        assert!(Command::parse(&toks("TABLE CREATE t WITH COLUMNS id(INT)")).is_err());
        assert!(Command::parse(&toks("TABLE CREATE t WITH COLUMNS id(INTEGER)[PK]")).is_err());
        assert!(Command::parse(&toks("TABLE CREATE t COLUMNS id(INTEGER)")).is_err());
    }

    #[test]
    fn test_parse_select_with_join_and_where() {
        let command = Command::parse(&toks(
            "SELECT users.name, pets.id FROM users LEFT JOIN pets ON users.id = pets.owner WHERE users.name LIKE 'A%'",
        ))
        .unwrap();

        let Command::Select {
            projection,
            tables,
            join,
            filter,
        } = command
        else {
            panic!("expected Select");
        };
        assert_eq!(
            projection,
            Projection::Columns(vec!["users.name".into(), "pets.id".into()])
        );
        assert_eq!(tables, vec!["users"]);
        let join = join.unwrap();
        assert_eq!(join.kind, JoinKind::Left);
        assert_eq!(join.right_table, "pets");
        assert_eq!(join.on_left.column, "id");
        assert_eq!(join.on_right.column, "owner");
        let filter = filter.unwrap();
        assert_eq!(filter.first.op, CompareOp::Like);
        assert_eq!(filter.first.value, "A%");
    }

    #[test]
    fn test_parse_malformed_join() {
        assert!(Command::parse(&toks("SELECT * FROM a INNER pets ON a.x = pets.y")).is_err());
        assert!(Command::parse(&toks("SELECT * FROM a INNER JOIN pets a.x = pets.y")).is_err());
        assert!(Command::parse(&toks("SELECT * FROM a INNER JOIN pets ON x = y")).is_err());
        assert!(
            Command::parse(&toks("SELECT * FROM a, b INNER JOIN pets ON a.x = pets.y")).is_err()
        );
    }

    #[test]
    fn test_parse_where_connectors() {
        let command =
            Command::parse(&toks("SELECT * FROM t WHERE a = 1 AND b > 2 || c <> 3")).unwrap();
        let Command::Select { filter, .. } = command else {
            panic!("expected Select");
        };
        let clause = filter.unwrap();
        assert_eq!(clause.first.column, "a");
        assert_eq!(clause.rest.len(), 2);
        assert_eq!(clause.rest[0].0, Connector::And);
        assert_eq!(clause.rest[1].0, Connector::Or);
        assert_eq!(clause.rest[1].1.op, CompareOp::NotEq);
    }

    #[test]
    fn test_parse_where_rejects_dangling_connector() {
        assert!(Command::parse(&toks("SELECT * FROM t WHERE a = 1 AND")).is_err());
        assert!(Command::parse(&toks("SELECT * FROM t WHERE a =")).is_err());
        assert!(Command::parse(&toks("DELETE FROM t WHERE")).is_err());
    }

    #[test]
    fn test_parse_update_assignments() {
        let command = Command::parse(&toks(
            "UPDATE users SET name = 'Ann', age = 31 WHERE id = 1",
        ))
        .unwrap();
        let Command::Update {
            table,
            assignments,
            filter,
        } = command
        else {
            panic!("expected Update");
        };
        assert_eq!(table, "users");
        assert_eq!(
            assignments,
            vec![
                ("name".to_string(), "Ann".to_string()),
                ("age".to_string(), "31".to_string())
            ]
        );
        assert!(filter.is_some());
    }

    #[test]
    fn test_parse_update_rejects_malformed_set() {
        assert!(Command::parse(&toks("UPDATE users SET")).is_err());
        assert!(Command::parse(&toks("UPDATE users SET name Ann")).is_err());
        assert!(Command::parse(&toks("UPDATE users name = Ann")).is_err());
    }

    #[test]
    fn test_insert_quoted_values() {
        let values = clean_values(&toks("1, 'Bob Dylan', 'x, y', 3.5")).unwrap();
        assert_eq!(values, vec!["1", "Bob Dylan", "x, y", "3.5"]);

        assert!(clean_values(&toks("'unterminated value")).is_err());
    }

    #[test]
    fn test_session_requires_database_selection() {
        let mut session = Session::new();
        let err = session
            .execute(&toks("TABLE CREATE t WITH COLUMNS id(INTEGER)"))
            .unwrap_err();
        assert_eq!(err, DbError::NoDatabaseSelected);
    }

    #[test]
    fn test_session_select_star_and_columns() {
        let mut session = shop_session();

        let all = session
            .execute(&toks("SELECT * FROM users"))
            .unwrap()
            .unwrap();
        assert_eq!(all.columns, vec!["id", "name"]);
        assert_eq!(all.rows.len(), 2);

        let names = session
            .execute(&toks("SELECT name FROM users"))
            .unwrap()
            .unwrap();
        assert_eq!(names.columns, vec!["name"]);
        assert_eq!(names.rows, vec![vec!["Ann".to_string()], vec!["Bo".to_string()]]);
    }

    #[test]
    fn test_session_select_unknown_column_fails() {
        let mut session = shop_session();
        let err = session
            .execute(&toks("SELECT ghost FROM users"))
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownColumn { .. }));
    }

    #[test]
    fn test_session_where_filters_full_rows_before_projection() {
        let mut session = shop_session();
        // the filter column is not part of the projection
        let set = session
            .execute(&toks("SELECT name FROM users WHERE id = 2"))
            .unwrap()
            .unwrap();
        assert_eq!(set.rows, vec![vec!["Bo".to_string()]]);
    }

    #[test]
    fn test_session_delete_where_leaves_rest() {
        let mut session = shop_session();
        session
            .execute(&toks("DELETE FROM users WHERE id = 1"))
            .unwrap();

        let set = session
            .execute(&toks("SELECT * FROM users"))
            .unwrap()
            .unwrap();
        assert_eq!(set.rows, vec![vec!["2".to_string(), "Bo".to_string()]]);
    }

    #[test]
    fn test_session_delete_without_where_empties_table() {
        let mut session = shop_session();
        session.execute(&toks("DELETE FROM users")).unwrap();
        let set = session
            .execute(&toks("SELECT * FROM users"))
            .unwrap()
            .unwrap();
        assert!(set.rows.is_empty());
    }

    #[test]
    fn test_session_update_scoped_by_where() {
        let mut session = shop_session();
        session
            .execute(&toks("UPDATE users SET name = Bob WHERE id = 2"))
            .unwrap();

        let set = session
            .execute(&toks("SELECT name FROM users"))
            .unwrap()
            .unwrap();
        assert_eq!(set.rows, vec![vec!["Ann".to_string()], vec!["Bob".to_string()]]);
    }

    #[test]
    fn test_session_update_primary_key_is_refused() {
        let mut session = shop_session();
        let err = session
            .execute(&toks("UPDATE users SET id = 9"))
            .unwrap_err();
        assert_eq!(err, DbError::ImmutableColumn("id".into()));
    }

    #[test]
    fn test_session_join_round_trip() {
        let mut session = shop_session();
        session
            .execute(&toks(
                "TABLE CREATE pets WITH COLUMNS id(INTEGER)[PRIMARY_KEY], owner(INTEGER)[FOREIGN_KEY]{users.id}",
            ))
            .unwrap();
        session
            .execute(&toks("INSERT INTO pets VALUES 10, 1"))
            .unwrap();

        let set = session
            .execute(&toks(
                "SELECT * FROM users LEFT JOIN pets ON users.id = pets.owner",
            ))
            .unwrap()
            .unwrap();
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0], vec!["1", "Ann", "10", "1"]);
        assert_eq!(set.rows[1], vec!["2", "Bo", "", ""]);

        let filtered = session
            .execute(&toks(
                "SELECT * FROM users LEFT JOIN pets ON users.id = pets.owner WHERE users.id = 2",
            ))
            .unwrap()
            .unwrap();
        assert_eq!(filtered.rows, vec![vec![
            "2".to_string(),
            "Bo".to_string(),
            String::new(),
            String::new()
        ]]);
    }

    #[test]
    fn test_session_multi_table_select_concatenates() {
        let mut session = shop_session();
        session
            .execute(&toks("TABLE CREATE admins WITH COLUMNS id(INTEGER), name(TEXT)"))
            .unwrap();
        session
            .execute(&toks("INSERT INTO admins VALUES 7, 'Root'"))
            .unwrap();

        let set = session
            .execute(&toks("SELECT name FROM users, admins"))
            .unwrap()
            .unwrap();
        assert_eq!(set.rows.len(), 3);
        assert_eq!(set.rows[2], vec!["Root"]);
    }

    #[test]
    fn test_session_alter_add_and_drop_column() {
        let mut session = shop_session();
        session
            .execute(&toks("ALTER TABLE users ADD COLUMN age(INTEGER)"))
            .unwrap();

        let set = session
            .execute(&toks("SELECT * FROM users"))
            .unwrap()
            .unwrap();
        assert_eq!(set.columns, vec!["id", "name", "age"]);
        assert_eq!(set.rows[0], vec!["1", "Ann", ""]);

        session
            .execute(&toks("ALTER TABLE users DROP COLUMN age"))
            .unwrap();
        let set = session
            .execute(&toks("SELECT * FROM users"))
            .unwrap()
            .unwrap();
        assert_eq!(set.columns, vec!["id", "name"]);
    }

    #[test]
    fn test_session_insert_with_spaces_in_value() {
        let mut session = shop_session();
        session
            .execute(&toks("INSERT INTO users VALUES 3, 'Bob Dylan'"))
            .unwrap();

        let set = session
            .execute(&toks("SELECT name FROM users WHERE id = 3"))
            .unwrap()
            .unwrap();
        assert_eq!(set.rows, vec![vec!["Bob Dylan".to_string()]]);
    }

    #[test]
    fn test_session_drop_database_clears_selection() {
        let mut session = shop_session();
        session.execute(&toks("DATABASE DROP shop")).unwrap();
        let err = session.execute(&toks("SELECT * FROM users")).unwrap_err();
        assert_eq!(err, DbError::NoDatabaseSelected);
    }

    #[test]
    fn test_session_failed_statement_changes_nothing() {
        let mut session = shop_session();
        // duplicate primary key
        assert!(session
            .execute(&toks("INSERT INTO users VALUES 1, 'Imposter'"))
            .is_err());

        let set = session
            .execute(&toks("SELECT * FROM users"))
            .unwrap()
            .unwrap();
        assert_eq!(set.rows.len(), 2);
    }
}
