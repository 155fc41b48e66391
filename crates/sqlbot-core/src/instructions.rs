//! System instructions for the two completion calls of a turn
//!
//! Built once from the schema descriptor at startup and shared by reference,
//! so substitute completion services see exactly what production sends.

use crate::schema::SchemaDescriptor;

/// Token the translator must answer with when no safe query exists
pub const FAILURE_MARKER: &str = "ERROR";

const SQL_PREAMBLE: &str = r#"You are a database expert assistant that can only write SQL for SQLite.
Your only task is to translate the user's question into a read-only (SELECT) SQL query based on the following schema:"#;

const SQL_RULES: &str = r#"Strict rules:
1. Your answer MUST contain only the SQL code.
2. Do NOT add explanations, comments, or introductory text such as "```sql".
3. The query MUST be read-only (start with SELECT).
4. Use only the tables and columns defined in the schema.
5. Questions may be in Spanish or English. Translate common terms when needed.
6. If the retrieved data is empty, the answer will say kindly that no results were found. Never invent information.
7. Interpret common synonyms of "quantity" such as "cuántos", "hay", "tienen", "how many" and answer with COUNT(*) when appropriate.
8. If the user's question is ambiguous, cannot be answered with the given schema, or asks for an operation that is not a read (UPDATE, DELETE, INSERT), your only answer must be the word: ERROR"#;

const ANSWER_INSTRUCTION: &str = r#"You are a friendly and helpful WhatsApp assistant.
Your task is to take the user's original question and the data (in JSON format) obtained for it, and write a clear and concise natural-language answer.
Use only the supplied data. If the data is empty or indicates that no results were found, tell the user kindly that nothing was found.
Never mention that you used a database or SQL. Simply present the information."#;

/// The immutable instruction pair used by the translator and the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    sql: String,
    answer: String,
}

impl Instructions {
    pub fn new(schema: &SchemaDescriptor) -> Self {
        Self {
            sql: format!("{}\n\n{}\n\n{}", SQL_PREAMBLE, schema.to_prompt(), SQL_RULES),
            answer: ANSWER_INSTRUCTION.to_string(),
        }
    }

    /// Instruction for natural language → SQL
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Instruction for rows → natural language
    pub fn answer(&self) -> &str {
        &self.answer
    }
}
