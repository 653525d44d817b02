//! DDL generated from the `vault-core` catalog.

use std::fmt::Write as _;

use vault_core::{Column, ColumnRole, ColumnType, Table};

/// Applied to every connection the store opens.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Lists user tables, skipping SQLite's internal ones.
pub const LIST_TABLES: &str =
  "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

fn sql_type(ty: ColumnType) -> String {
  match ty {
    ColumnType::HashKey => "BLOB".to_owned(),
    ColumnType::Integer => "INTEGER".to_owned(),
    ColumnType::Text => "TEXT".to_owned(),
    ColumnType::Varchar(n) => format!("VARCHAR({n})"),
    // RFC 3339 text; SQLite has no native timestamp type.
    ColumnType::Timestamp => "TEXT".to_owned(),
  }
}

fn column_def(column: &Column) -> String {
  let mut def = format!("{} {}", column.name, sql_type(column.ty));
  if !column.nullable() {
    def.push_str(" NOT NULL");
  }
  if column.role == ColumnRole::BusinessKey {
    def.push_str(" UNIQUE");
  }
  match column.ty {
    ColumnType::HashKey => {
      let _ = write!(def, " CHECK (length({}) = 32)", column.name);
    }
    ColumnType::Varchar(n) => {
      let _ = write!(def, " CHECK (length({}) <= {n})", column.name);
    }
    _ => {}
  }
  def
}

/// `CREATE TABLE` statement for one catalog table.
pub fn create_table(table: &Table) -> String {
  let mut lines: Vec<String> = table.columns.iter().map(column_def).collect();

  let pk: Vec<_> = table.primary_key().map(|c| c.name).collect();
  if !pk.is_empty() {
    lines.push(format!("PRIMARY KEY ({})", pk.join(", ")));
  }
  for column in table.columns {
    if let Some(fk) = column.references {
      lines.push(format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        column.name, fk.table, fk.column
      ));
    }
  }

  format!("CREATE TABLE {} (\n    {}\n);", table.name, lines.join(",\n    "))
}
