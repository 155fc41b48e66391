//! sqlbot core - read-only query mediation
//!
//! Turns a free-text question into a read-only SQL statement with an LLM,
//! gates it through a lexical safety check, runs it, and phrases the rows
//! back as a natural-language answer.

pub mod completion;
pub mod composer;
pub mod error;
pub mod executor;
pub mod instructions;
pub mod pipeline;
pub mod schema;
pub mod translator;
pub mod validator;

pub use completion::{CompletionError, CompletionRequest, CompletionService};
pub use error::{PipelineError, ReplyMessages};
pub use executor::{ExecutionError, QueryExecutor, ResultSet, Row};
pub use pipeline::{Outcome, Pipeline, Stage, Turn};
pub use schema::{ColumnDef, SchemaDescriptor, SchemaError, TableDef};
pub use validator::{is_read_only, ValidatedQuery};
