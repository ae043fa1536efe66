//! Column/value payloads for INSERT and UPDATE.

use crate::error::{FluentError, FluentResult};
use crate::qb::param::Param;
use tokio_postgres::types::ToSql;

/// One column slot in a [`Record`].
#[derive(Clone, Debug)]
pub(crate) enum Field {
    /// A bound value, including SQL NULL via `Option::None`.
    Value(Param),
    /// Explicitly marked "no value supplied". Distinct from NULL: a record
    /// carrying an unset column is rejected before any statement compiles.
    Unset,
}

/// An insertion-ordered column -> value payload.
///
/// Used for inserts, updates and the map form of equality filtering. Column
/// order is the order of `set` calls; setting a column twice keeps the
/// original position and replaces the value.
///
/// # Example
///
/// ```ignore
/// let rec = Record::new()
///     .set("username", "alice")
///     .set("age", 30i32)
///     .set_opt::<String>("bio", None); // omitted entirely
/// ```
#[derive(Clone, Debug, Default)]
pub struct Record {
    pub(crate) fields: Vec<(String, Field)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&mut self, column: &str, field: Field) {
        if let Some(slot) = self.fields.iter_mut().find(|(c, _)| c == column) {
            slot.1 = field;
        } else {
            self.fields.push((column.to_string(), field));
        }
    }

    /// Set a column to a value.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.put(column, Field::Value(Param::new(value)));
        self
    }

    /// Set a column from an `Option`: `Some` binds the value, `None` omits
    /// the column from the record entirely.
    pub fn set_opt<T: ToSql + Send + Sync + 'static>(
        mut self,
        column: &str,
        value: Option<T>,
    ) -> Self {
        if let Some(v) = value {
            self.put(column, Field::Value(Param::new(v)));
        } else {
            self.fields.retain(|(c, _)| c != column);
        }
        self
    }

    /// Mark a column as explicitly unset.
    ///
    /// An unset column is a caller-contract violation at write time: inserts
    /// and updates refuse the record and name the column.
    pub fn unset(mut self, column: &str) -> Self {
        self.put(column, Field::Unset);
        self
    }

    /// Serialize a value to JSON and bind it as a `jsonb`-compatible
    /// parameter.
    pub fn set_json<T: serde::Serialize>(mut self, column: &str, value: &T) -> FluentResult<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| FluentError::validation(format!("{column}: {e}")))?;
        self.put(column, Field::Value(Param::new(json)));
        Ok(self)
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|(c, _)| c.as_str()).collect()
    }

    /// Number of columns in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record carries no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The first explicitly unset column, if any.
    pub(crate) fn first_unset(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, f)| matches!(f, Field::Unset))
            .map(|(c, _)| c.as_str())
    }

    /// The bound value for a column, or `None` if absent or unset.
    pub(crate) fn value(&self, column: &str) -> Option<&Param> {
        self.fields.iter().find_map(|(c, f)| match f {
            Field::Value(p) if c == column => Some(p),
            _ => None,
        })
    }

    /// Iterate columns paired with their bound values, skipping nothing.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(c, f)| (c.as_str(), f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let rec = Record::new().set("b", 1i32).set("a", 2i32).set("c", 3i32);
        assert_eq!(rec.columns(), vec!["b", "a", "c"]);
    }

    #[test]
    fn set_twice_replaces_in_place() {
        let rec = Record::new().set("a", 1i32).set("b", 2i32).set("a", 9i32);
        assert_eq!(rec.columns(), vec!["a", "b"]);
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn set_opt_none_omits_the_column() {
        let rec = Record::new()
            .set("a", 1i32)
            .set_opt::<String>("bio", None);
        assert_eq!(rec.columns(), vec!["a"]);
    }

    #[test]
    fn unset_is_tracked() {
        let rec = Record::new().set("a", 1i32).unset("b");
        assert_eq!(rec.first_unset(), Some("b"));
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn set_json_binds_a_json_value() {
        #[derive(serde::Serialize)]
        struct Meta {
            tags: Vec<String>,
        }
        let rec = Record::new()
            .set_json("meta", &Meta { tags: vec!["x".into()] })
            .unwrap();
        assert_eq!(rec.columns(), vec!["meta"]);
        assert!(rec.first_unset().is_none());
    }
}
