
/// A value bound into a statement. Values never become part of the
/// statement shape; they are only turned into literals by `render`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Null,
}

impl SqlValue {
    pub fn text<T: Into<String>>(value: T) -> SqlValue {
        SqlValue::Text(value.into())
    }

    pub fn nullable_text(value: Option<&str>) -> SqlValue {
        match value {
            Some(text) => SqlValue::Text(text.to_string()),
            None => SqlValue::Null,
        }
    }

    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Text(text) => format!("'{}'", text.replace('\'', "''")),
            SqlValue::Integer(number) => number.to_string(),
            SqlValue::Null => String::from("NULL"),
        }
    }
}

/// Statement shape plus the values for its `?` placeholders, in order.
/// Shapes are assembled only from identifiers owned by this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    shape: String,
    values: Vec<SqlValue>,
}

impl Statement {
    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn delete_where(relation: &str, column: &str, value: SqlValue) -> Statement {
        Statement {
            shape: format!("DELETE FROM {} WHERE {} = ?;", relation, column),
            values: vec![value],
        }
    }

    /// Combines single-row selects into one multi-row insert. Returns
    /// `None` when there are no rows to insert.
    pub fn insert_union_all(relation: &str, rows: &[Statement]) -> Option<Statement> {
        if rows.is_empty() {
            return None;
        }
        let shapes: Vec<&str> = rows.iter().map(|row| row.shape.as_str()).collect();
        let values = rows.iter().flat_map(|row| row.values.iter().cloned()).collect();
        Some(Statement {
            shape: format!("INSERT INTO {} {};", relation, shapes.join(" UNION ALL ")),
            values,
        })
    }

    /// Engine text with every placeholder replaced by its literal.
    pub fn render(&self) -> String {
        let mut rendered = String::with_capacity(self.shape.len() + self.values.len() * 16);
        let mut values = self.values.iter();
        for c in self.shape.chars() {
            if c == '?' {
                match values.next() {
                    Some(value) => rendered.push_str(&value.to_literal()),
                    None => rendered.push_str("NULL"),
                }
            } else {
                rendered.push(c);
            }
        }
        rendered
    }
}

/// Builder for a `SELECT ? AS column, ...` row fragment.
#[derive(Debug, Default)]
pub struct SelectRow {
    columns: Vec<(&'static str, SqlValue)>,
}

impl SelectRow {
    pub fn new() -> SelectRow {
        SelectRow::default()
    }

    pub fn column(mut self, name: &'static str, value: SqlValue) -> SelectRow {
        self.columns.push((name, value));
        self
    }

    pub fn text<T: Into<String>>(self, name: &'static str, value: T) -> SelectRow {
        self.column(name, SqlValue::text(value))
    }

    pub fn build(self) -> Statement {
        let projections: Vec<String> = self
            .columns
            .iter()
            .map(|(name, _)| format!("? AS {}", name))
            .collect();
        Statement {
            shape: format!("SELECT {}", projections.join(", ")),
            values: self.columns.into_iter().map(|(_, value)| value).collect(),
        }
    }
}
