//! In-memory session table: one row per session, ordered named columns.

mod rename;

pub use rename::RenameMap;

use crate::error::{FeatureError, Result};
use chrono::NaiveDateTime;
use std::fmt;

/// Site identifier as it appears in a `site{k}` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Text(v) => f.write_str(v),
        }
    }
}

/// A nullable column. Every kind stores one entry per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<Option<String>>),
    Int(Vec<Option<i64>>),
    Datetime(Vec<Option<NaiveDateTime>>),
    List(Vec<Option<Vec<Scalar>>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Datetime(v) => v.len(),
            Column::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Column::Text(_) => "text",
            Column::Int(_) => "int",
            Column::Datetime(_) => "datetime",
            Column::List(_) => "list",
        }
    }

    pub fn as_int(&self) -> Option<&[Option<i64>]> {
        match self {
            Column::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            Column::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&[Option<NaiveDateTime>]> {
        match self {
            Column::Datetime(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Option<Vec<Scalar>>]> {
        match self {
            Column::List(v) => Some(v),
            _ => None,
        }
    }

    /// Cell as a site identifier. Only `Int` and `Text` columns hold identifiers.
    pub fn scalar_at(&self, row: usize) -> Option<Scalar> {
        match self {
            Column::Int(v) => v.get(row).copied().flatten().map(Scalar::Int),
            Column::Text(v) => v.get(row).cloned().flatten().map(Scalar::Text),
            _ => None,
        }
    }
}

/// Table of sessions. Columns keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns; all columns must have the same length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut ds = Dataset::new();
        for (name, column) in columns {
            let name = name.into();
            if ds.position(&name).is_some() {
                return Err(FeatureError::Schema(format!("duplicate column '{name}'")));
            }
            ds = ds.with_column(name, column)?;
        }
        Ok(ds)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Iterate columns in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    /// Append a column, or replace it in place when the name already exists.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        let name = name.into();
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(FeatureError::Schema(format!(
                "column '{name}' has {} rows, table has {}",
                column.len(),
                self.n_rows
            )));
        }
        match self.position(&name) {
            Some(i) => self.columns[i] = column,
            None => {
                self.names.push(name);
                self.columns.push(column);
            }
        }
        Ok(self)
    }

    pub fn with_columns<I>(self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Column)>,
    {
        columns
            .into_iter()
            .try_fold(self, |ds, (name, column)| ds.with_column(name, column))
    }

    /// Rename columns according to a validated mapping.
    pub fn rename(mut self, map: &RenameMap) -> Result<Self> {
        for (from, to) in map.iter() {
            if self.position(from).is_none() {
                return Err(FeatureError::Schema(format!(
                    "cannot rename missing column '{from}'"
                )));
            }
            if self.position(to).is_some() && !map.renames(to) {
                return Err(FeatureError::Schema(format!(
                    "renaming '{from}' would overwrite existing column '{to}'"
                )));
            }
        }
        for name in self.names.iter_mut() {
            if let Some(to) = map.target(name) {
                *name = to.to_string();
            }
        }
        Ok(self)
    }

    /// Columns named exactly `{prefix}{k}` for a positive integer `k`, sorted by `k`.
    pub fn indexed_family(&self, prefix: &str) -> Vec<(usize, &str)> {
        let mut family: Vec<(usize, &str)> = self
            .names
            .iter()
            .filter_map(|name| {
                let suffix = name.strip_prefix(prefix)?;
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let k: usize = suffix.parse().ok()?;
                (k > 0).then_some((k, name.as_str()))
            })
            .collect();
        family.sort_by_key(|&(k, _)| k);
        family
    }

    /// Datetime column by name, failing with a schema error when absent or of another kind.
    pub fn datetime(&self, name: &str) -> Result<&[Option<NaiveDateTime>]> {
        let column = self
            .column(name)
            .ok_or_else(|| FeatureError::Schema(format!("missing column '{name}'")))?;
        column.as_datetime().ok_or_else(|| {
            FeatureError::Schema(format!(
                "column '{name}' is {}, expected datetime",
                column.kind()
            ))
        })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[Option<&str>]) -> Column {
        Column::Text(values.iter().map(|v| v.map(String::from)).collect())
    }

    #[test]
    fn test_from_columns_rejects_length_mismatch() {
        let err = Dataset::from_columns([
            ("a", Column::Int(vec![Some(1), Some(2)])),
            ("b", Column::Int(vec![Some(1)])),
        ])
        .unwrap_err();
        assert!(matches!(err, FeatureError::Schema(_)));
    }

    #[test]
    fn test_from_columns_rejects_duplicates() {
        let err = Dataset::from_columns([
            ("a", Column::Int(vec![Some(1)])),
            ("a", Column::Int(vec![Some(2)])),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_with_column_replaces_in_place() {
        let ds = Dataset::from_columns([
            ("a", Column::Int(vec![Some(1)])),
            ("b", Column::Int(vec![Some(2)])),
        ])
        .unwrap()
        .with_column("a", Column::Int(vec![Some(9)]))
        .unwrap();
        assert_eq!(ds.column_names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(ds.column("a").unwrap().as_int().unwrap(), &[Some(9)]);
    }

    #[test]
    fn test_indexed_family_is_exact_and_sorted() {
        let ds = Dataset::from_columns([
            ("time10", text(&[None])),
            ("time2", text(&[None])),
            ("time1", text(&[None])),
            ("time_of_day_x", text(&[None])),
            ("time0", text(&[None])),
            ("times", text(&[None])),
        ])
        .unwrap();
        let family: Vec<usize> = ds.indexed_family("time").iter().map(|(k, _)| *k).collect();
        assert_eq!(family, vec![1, 2, 10]);
    }

    #[test]
    fn test_scalar_at_reads_ids_and_names() {
        let ints = Column::Int(vec![Some(4), None]);
        let names = text(&[Some("vk.com")]);
        assert_eq!(ints.scalar_at(0), Some(Scalar::Int(4)));
        assert_eq!(ints.scalar_at(1), None);
        assert_eq!(names.scalar_at(0), Some(Scalar::Text("vk.com".into())));
        assert_eq!(Column::Datetime(vec![None]).scalar_at(0), None);
    }

    #[test]
    fn test_datetime_accessor_checks_kind() {
        let ds = Dataset::from_columns([("time1", text(&[Some("x")]))]).unwrap();
        assert!(ds.datetime("time1").is_err());
        assert!(ds.datetime("datetime1").is_err());
    }
}
