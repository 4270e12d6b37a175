pub mod checker;
pub mod column_type;
pub mod command;
pub mod compare;
pub mod constraint;
pub mod database;
pub mod error;
pub mod filter;
pub mod join;
pub mod rowset;
pub mod storage;
pub mod table;

pub use column_type::ColumnType;
pub use command::{Command, Session};
pub use constraint::{Constraint, ForeignKeyRef};
pub use database::{Catalog, Database};
pub use error::DbError;
pub use rowset::{Projection, RowSet};
pub use table::{ColumnDef, Table};
