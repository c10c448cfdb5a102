//! Tables, filters and ordering for store selects

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Remote table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Boards,
    Columns,
    Tasks,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Boards, Table::Columns, Table::Tasks];

    /// Table name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Boards => "boards",
            Table::Columns => "columns",
            Table::Tasks => "tasks",
        }
    }

    /// The table owning rows of this table, with the foreign key column
    pub fn owner(&self) -> Option<(Table, &'static str)> {
        match self {
            Table::Boards => None,
            Table::Columns => Some((Table::Boards, "board_id")),
            Table::Tasks => Some((Table::Columns, "column_id")),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: String },

    /// The owning row in `parent` has `column = value`
    ///
    /// Selects, for example, all tasks whose column belongs to a board.
    ParentEq {
        parent: Table,
        column: String,
        value: String,
    },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.to_string(),
        }
    }

    pub fn parent_eq(parent: Table, column: impl Into<String>, value: impl ToString) -> Self {
        Filter::ParentEq {
            parent,
            column: column.into(),
            value: value.to_string(),
        }
    }
}

/// Ordering clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A select against one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Selects every row of a table
    pub fn table(table: Table) -> Self {
        Query {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn parent_eq(mut self, parent: Table, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::parent_eq(parent, column, value));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Text form of a scalar JSON value, used for equality filters
pub fn json_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
