//! Parameterized query construction for the access table
//!
//! SQL text is assembled only from the fixed names of `Column` and
//! `CompareOp`; every value travels as a bound parameter.

use rusqlite::types::Value;

/// Columns of the access table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Ip,
    Time,
    Url,
    Code,
}

impl Column {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Ip => "ip",
            Column::Time => "time",
            Column::Url => "url",
            Column::Code => "code",
        }
    }
}

/// Comparison operator of a predicate clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// One `column op value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: Column,
    pub op: CompareOp,
    pub value: Value,
}

/// AND-conjunction of clauses; empty means "all rows"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Predicate matching every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Single equality clause
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Self::all().and(column, CompareOp::Eq, value)
    }

    /// Add a clause to the conjunction
    pub fn and(mut self, column: Column, op: CompareOp, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause {
            column,
            op,
            value: value.into(),
        });
        self
    }

    /// ` WHERE a = ? AND b = ?`, or empty for no clauses
    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let conditions: Vec<String> = self
            .clauses
            .iter()
            .map(|c| format!("{} {} ?", c.column.as_sql(), c.op.as_sql()))
            .collect();
        format!(" WHERE {}", conditions.join(" AND "))
    }

    /// Bound values in clause order
    pub fn values(&self) -> Vec<Value> {
        self.clauses.iter().map(|c| c.value.clone()).collect()
    }
}

/// `SELECT cols FROM access [WHERE ..] [ORDER BY id] LIMIT ? OFFSET ?`
pub fn select_page(columns: &[Column], predicate: &Predicate, ordered: bool) -> String {
    let names: Vec<&str> = columns.iter().map(Column::as_sql).collect();
    let mut sql = format!("SELECT {} FROM access", names.join(", "));
    sql.push_str(&predicate.where_sql());
    if ordered {
        sql.push_str(" ORDER BY id");
    }
    sql.push_str(" LIMIT ? OFFSET ?");
    sql
}

/// `SELECT COUNT(1) FROM access [WHERE ..]`
pub fn count(predicate: &Predicate) -> String {
    format!("SELECT COUNT(1) FROM access{}", predicate.where_sql())
}

/// One fetched row, holding only the requested columns
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<(Column, Value)>,
}

impl Row {
    pub(crate) fn new(values: Vec<(Column, Value)>) -> Self {
        Self { values }
    }

    pub fn get(&self, column: Column) -> Option<&Value> {
        self.values
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    pub fn text(&self, column: Column) -> Option<&str> {
        match self.get(column) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, column: Column) -> Option<i64> {
        match self.get(column) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Take a text column out of the row
    pub fn into_text(self, column: Column) -> Option<String> {
        self.values
            .into_iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, v)| match v {
                Value::Text(s) => Some(s),
                _ => None,
            })
    }
}
