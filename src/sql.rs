//! SQL text construction for the database CLI.
//!
//! The CLI boundary takes SQL as a string and offers no parameter binding,
//! so statements are rendered as text with quote-doubling escaping. That is
//! a minimal substitute for real binding, sufficient for SQLite-dialect
//! literals; it is not a general escaping layer.
use crate::Row;
use serde_json::Value;
use std::path::Path;

/// Render a scalar as a SQL literal: `NULL` unquoted, numbers bare,
/// booleans as SQLite integers, strings quoted with embedded quotes doubled.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

/// Wrap a string in single quotes, doubling any embedded single quote.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// `INSERT INTO t (cols...) VALUES (...);` with columns in row order.
pub fn insert(table: &str, row: &Row) -> String {
    let columns = row.keys().cloned().collect::<Vec<String>>().join(", ");
    let values = row.values().map(literal).collect::<Vec<String>>().join(", ");
    format!("INSERT INTO {} ({}) VALUES ({});", table, columns, values)
}

/// The repoint statement written after a successful upload.
pub fn update_pointer(table: &str, column: &str, pointer: &str, id: i64) -> String {
    format!(
        "UPDATE {} SET {} = {} WHERE id = {};",
        table,
        column,
        quote(pointer),
        id
    )
}

/// An accumulated SQL script artifact: a titled header, optional
/// foreign-key guard, and appended statements, written to disk and applied
/// in a single CLI invocation.
pub struct Script {
    title: String,
    guard: bool,
    lines: Vec<String>,
    statements: usize,
}

impl Script {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            guard: false,
            lines: Vec::new(),
            statements: 0,
        }
    }

    /// Wrap the body in `PRAGMA foreign_keys = OFF/ON`.
    pub fn guarded(mut self) -> Self {
        self.guard = true;
        self
    }

    pub fn comment(&mut self, text: &str) {
        self.lines.push(format!("-- {}", text));
    }

    pub fn push(&mut self, statement: String) {
        self.lines.push(statement);
        self.statements += 1;
    }

    /// Number of statements appended; comments do not count.
    pub fn statements(&self) -> usize {
        self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements == 0
    }

    pub fn render(&self) -> String {
        let mut out = format!("-- {}\n\n", self.title);
        if self.guard {
            out.push_str("PRAGMA foreign_keys = OFF;\n\n");
        }
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        if self.guard {
            out.push_str("\nPRAGMA foreign_keys = ON;\n");
        }
        out
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_bare() {
        assert_eq!(literal(&Value::Null), "NULL");
    }

    #[test]
    fn numbers_are_unquoted() {
        assert_eq!(literal(&json!(42)), "42");
        assert_eq!(literal(&json!(-3.5)), "-3.5");
    }

    #[test]
    fn booleans_are_sqlite_integers() {
        assert_eq!(literal(&json!(true)), "1");
        assert_eq!(literal(&json!(false)), "0");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(literal(&json!("o'clock, isn't it")), "'o''clock, isn''t it'");
    }

    #[test]
    fn insert_keeps_column_order() {
        let row: Row = serde_json::from_str(r#"{"id": 7, "email": "a@b.c", "name": null}"#).unwrap();
        assert_eq!(
            insert("users", &row),
            "INSERT INTO users (id, email, name) VALUES (7, 'a@b.c', NULL);"
        );
    }

    #[test]
    fn update_pointer_quotes_the_pointer() {
        assert_eq!(
            update_pointer("campaigns", "thumbnail_image", "/api/images/13.jpg", 13),
            "UPDATE campaigns SET thumbnail_image = '/api/images/13.jpg' WHERE id = 13;"
        );
    }

    #[test]
    fn script_guard_brackets_the_body() {
        let mut script = Script::new("snapshot").guarded();
        script.comment("table users: 1 rows");
        script.push("DELETE FROM users;".to_string());
        let text = script.render();
        let off = text.find("PRAGMA foreign_keys = OFF;").unwrap();
        let body = text.find("DELETE FROM users;").unwrap();
        let on = text.find("PRAGMA foreign_keys = ON;").unwrap();
        assert!(off < body && body < on);
        assert_eq!(script.statements(), 1);
    }
}
