//! Schema descriptor - the static description of what the bot may query
//!
//! The descriptor is built once at startup (from `config.yaml` or the
//! built-in default) and shared read-only by every pipeline turn.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema must describe at least one table")]
    NoTables,

    #[error("Table '{0}' has no columns")]
    NoColumns(String),

    #[error("Table name must not be empty")]
    EmptyTableName,
}

/// One queryable column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Semantic type as the database names it (INTEGER, TEXT, ...)
    pub data_type: String,
    pub description: String,
}

/// One queryable table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

/// Immutable description of the queryable tables and columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescriptor {
    tables: Vec<TableDef>,
}

impl SchemaDescriptor {
    pub fn new(tables: Vec<TableDef>) -> Result<Self, SchemaError> {
        if tables.is_empty() {
            return Err(SchemaError::NoTables);
        }
        for table in &tables {
            if table.name.trim().is_empty() {
                return Err(SchemaError::EmptyTableName);
            }
            if table.columns.is_empty() {
                return Err(SchemaError::NoColumns(table.name.clone()));
            }
        }
        Ok(Self { tables })
    }

    /// The single `artists` table the bot ships with
    pub fn artists() -> Self {
        Self {
            tables: vec![TableDef {
                name: "artists".to_string(),
                columns: vec![
                    ColumnDef {
                        name: "ArtistId".to_string(),
                        data_type: "INTEGER".to_string(),
                        description: "unique artist identifier".to_string(),
                    },
                    ColumnDef {
                        name: "Name".to_string(),
                        data_type: "TEXT".to_string(),
                        description: "artist name".to_string(),
                    },
                ],
            }],
        }
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Render the descriptor as the plain-text block embedded in the
    /// translation instruction
    pub fn to_prompt(&self) -> String {
        let mut out = String::new();

        for table in &self.tables {
            out.push_str(&format!("Table: {}\n", table.name));
            out.push_str("Columns:\n");
            for col in &table.columns {
                out.push_str(&format!(
                    "- {} ({}, {})\n",
                    col.name, col.data_type, col.description
                ));
            }
            out.push('\n');
        }

        out.trim_end().to_string()
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::artists()
    }
}
