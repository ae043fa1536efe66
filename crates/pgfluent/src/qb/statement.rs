//! Statement compilation: accumulated clause state to `(sql, params)`.
//!
//! Predicates are stored with `?` markers and rendered to `$1..$n` positional
//! placeholders here. The i-th marker in document order binds the i-th
//! accumulated parameter; a count mismatch is a programming defect surfaced
//! as a validation error before any I/O.

use crate::error::{FluentError, FluentResult};
use crate::qb::param::ParamList;
use crate::qb::record::{Field, Record};

/// Sort direction for the single ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// The single LIMIT clause, optionally offset-aware.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LimitClause {
    pub limit: i64,
    pub offset: Option<i64>,
}

/// Accumulated clause state for one logical query.
///
/// Terminal operations move this out of the builder with `mem::take`, so the
/// builder is reset on every exit path.
#[derive(Debug, Clone, Default)]
pub(crate) struct QueryState {
    /// Selected columns; empty means `*`.
    pub columns: Vec<String>,
    /// Rendered join clauses, append-only.
    pub joins: Vec<String>,
    /// Rendered boolean fragments containing `?` markers.
    pub predicates: Vec<String>,
    /// Bound values; the i-th `?` across predicates binds `params[i]`.
    pub params: ParamList,
    pub order: Option<(String, SortDir)>,
    pub limit: Option<LimitClause>,
    /// Deferred caller-contract violation, surfaced at the terminal call.
    pub build_error: Option<String>,
}

/// A fully rendered statement ready for the executor.
#[derive(Debug)]
pub(crate) struct CompiledStatement {
    pub sql: String,
    pub params: ParamList,
}

/// Replace each `?` marker in a fragment with the next `$n` placeholder.
fn render_markers(fragment: &str, next: &mut usize) -> String {
    let mut out = String::with_capacity(fragment.len() + 4);
    for ch in fragment.chars() {
        if ch == '?' {
            out.push('$');
            out.push_str(&next.to_string());
            *next += 1;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Render the WHERE clause, numbering markers starting at `first`.
///
/// Returns the clause (leading space included, empty when no predicates) and
/// checks the marker/parameter invariant against `expected` markers total.
fn render_where(state: &QueryState, first: usize, expected: usize) -> FluentResult<String> {
    let mut next = first;
    let rendered: Vec<String> = state
        .predicates
        .iter()
        .map(|p| render_markers(p, &mut next))
        .collect();
    let used = next - first;
    if used != expected {
        return Err(FluentError::validation(format!(
            "predicate placeholders ({used}) do not match bound parameters ({expected})"
        )));
    }
    if rendered.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" WHERE {}", rendered.join(" AND ")))
    }
}

fn check_build_error(state: &QueryState) -> FluentResult<()> {
    match &state.build_error {
        Some(msg) => Err(FluentError::validation(msg.clone())),
        None => Ok(()),
    }
}

/// Compile a SELECT from the accumulated state.
pub(crate) fn compile_select(table: &str, state: &QueryState) -> FluentResult<CompiledStatement> {
    check_build_error(state)?;

    let columns = if state.columns.is_empty() {
        "*".to_string()
    } else {
        state.columns.join(", ")
    };

    let mut sql = format!("SELECT {columns} FROM {table}");
    for join in &state.joins {
        sql.push(' ');
        sql.push_str(join);
    }
    sql.push_str(&render_where(state, 1, state.params.len())?);

    if let Some((column, dir)) = &state.order {
        sql.push_str(&format!(" ORDER BY {column} {}", dir.as_sql()));
    }
    if let Some(clause) = &state.limit {
        sql.push_str(&format!(" LIMIT {}", clause.limit));
        if let Some(offset) = clause.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    Ok(CompiledStatement {
        sql,
        params: state.params.clone(),
    })
}

/// Compile a COUNT over the same JOIN/WHERE state, ignoring order and limit.
pub(crate) fn compile_count(
    table: &str,
    state: &QueryState,
    column: Option<&str>,
) -> FluentResult<CompiledStatement> {
    check_build_error(state)?;

    let target = column.unwrap_or("*");
    let mut sql = format!("SELECT COUNT({target}) FROM {table}");
    for join in &state.joins {
        sql.push(' ');
        sql.push_str(join);
    }
    sql.push_str(&render_where(state, 1, state.params.len())?);

    Ok(CompiledStatement {
        sql,
        params: state.params.clone(),
    })
}

/// Compile a single-row INSERT, returning the generated id.
pub(crate) fn compile_insert(table: &str, record: &Record) -> FluentResult<CompiledStatement> {
    if record.is_empty() {
        return Err(FluentError::validation("INSERT requires at least one column"));
    }
    if let Some(column) = record.first_unset() {
        return Err(FluentError::validation(format!(
            "INSERT payload column '{column}' has no value"
        )));
    }

    let mut params = ParamList::new();
    let mut columns = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    for (column, field) in record.entries() {
        let Field::Value(param) = field else {
            unreachable!("unset fields rejected above");
        };
        let idx = params.push_param(param.clone());
        columns.push(column.to_string());
        placeholders.push(format!("${idx}"));
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING id",
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok(CompiledStatement { sql, params })
}

/// Compile a multi-row INSERT with a single VALUES list.
///
/// Every record must carry exactly the first record's column set; parameters
/// are flattened row-major in the first record's column order.
pub(crate) fn compile_insert_bulk(
    table: &str,
    records: &[Record],
) -> FluentResult<CompiledStatement> {
    let Some(first) = records.first() else {
        return Err(FluentError::validation("bulk INSERT requires at least one record"));
    };
    if first.is_empty() {
        return Err(FluentError::validation("bulk INSERT records must carry at least one column"));
    }
    let columns = first.columns();

    let mut params = ParamList::new();
    let mut rows = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if record.len() != columns.len() {
            return Err(FluentError::validation(format!(
                "bulk INSERT record {row} has {} columns, expected {}",
                record.len(),
                columns.len()
            )));
        }
        if let Some(column) = record.first_unset() {
            return Err(FluentError::validation(format!(
                "bulk INSERT record {row} column '{column}' has no value"
            )));
        }
        let mut placeholders = Vec::with_capacity(columns.len());
        for column in &columns {
            let Some(param) = record.value(column) else {
                return Err(FluentError::validation(format!(
                    "bulk INSERT record {row} is missing column '{column}'"
                )));
            };
            let idx = params.push_param(param.clone());
            placeholders.push(format!("${idx}"));
        }
        rows.push(format!("({})", placeholders.join(", ")));
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES {}",
        columns.join(", "),
        rows.join(", ")
    );
    Ok(CompiledStatement { sql, params })
}

/// Compile an UPDATE. SET placeholders precede WHERE placeholders, and at
/// least one predicate is required.
pub(crate) fn compile_update(
    table: &str,
    state: &QueryState,
    record: &Record,
) -> FluentResult<CompiledStatement> {
    check_build_error(state)?;
    if record.is_empty() {
        return Err(FluentError::validation("UPDATE requires at least one column to set"));
    }
    if let Some(column) = record.first_unset() {
        return Err(FluentError::validation(format!(
            "UPDATE payload column '{column}' has no value"
        )));
    }
    if state.predicates.is_empty() {
        return Err(FluentError::validation(
            "UPDATE requires at least one predicate; full-table updates are rejected",
        ));
    }

    let mut params = ParamList::new();
    let mut assignments = Vec::with_capacity(record.len());
    for (column, field) in record.entries() {
        let Field::Value(param) = field else {
            unreachable!("unset fields rejected above");
        };
        let idx = params.push_param(param.clone());
        assignments.push(format!("{column} = ${idx}"));
    }

    let where_clause = render_where(state, params.len() + 1, state.params.len())?;
    params.extend(&state.params);

    let sql = format!(
        "UPDATE {table} SET {}{where_clause}",
        assignments.join(", ")
    );
    Ok(CompiledStatement { sql, params })
}

/// Compile a DELETE. At least one predicate is required.
pub(crate) fn compile_delete(table: &str, state: &QueryState) -> FluentResult<CompiledStatement> {
    check_build_error(state)?;
    if state.predicates.is_empty() {
        return Err(FluentError::validation(
            "DELETE requires at least one predicate; full-table deletes are rejected",
        ));
    }

    let where_clause = render_where(state, 1, state.params.len())?;
    Ok(CompiledStatement {
        sql: format!("DELETE FROM {table}{where_clause}"),
        params: state.params.clone(),
    })
}

/// Compile a TRUNCATE. No parameters, no predicates.
pub(crate) fn compile_truncate(table: &str) -> CompiledStatement {
    CompiledStatement {
        sql: format!("TRUNCATE TABLE {table}"),
        params: ParamList::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(predicates: Vec<&str>, param_count: usize) -> QueryState {
        let mut state = QueryState::default();
        state.predicates = predicates.into_iter().map(String::from).collect();
        for i in 0..param_count {
            state.params.push(i as i32);
        }
        state
    }

    #[test]
    fn select_defaults_to_wildcard() {
        let stmt = compile_select("users", &QueryState::default()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM users");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn select_renders_markers_in_order() {
        let mut state = state_with(vec!["age > ?", "status = ?"], 2);
        state.columns = vec!["id".into(), "username".into()];
        state.order = Some(("id".into(), SortDir::Desc));
        state.limit = Some(LimitClause {
            limit: 10,
            offset: Some(20),
        });
        let stmt = compile_select("users", &state).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT id, username FROM users WHERE age > $1 AND status = $2 \
             ORDER BY id DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn select_includes_joins_before_where() {
        let mut state = state_with(vec!["users.active = ?"], 1);
        state.joins = vec!["INNER JOIN posts ON users.id = posts.user_id".into()];
        let stmt = compile_select("users", &state).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM users INNER JOIN posts ON users.id = posts.user_id \
             WHERE users.active = $1"
        );
    }

    #[test]
    fn marker_parameter_mismatch_is_a_validation_error() {
        let state = state_with(vec!["age > ?"], 2);
        let err = compile_select("users", &state).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn count_drops_order_and_limit() {
        let mut state = state_with(vec!["age > ?"], 1);
        state.order = Some(("id".into(), SortDir::Asc));
        state.limit = Some(LimitClause {
            limit: 5,
            offset: None,
        });
        let stmt = compile_count("users", &state, None).unwrap();
        assert_eq!(stmt.sql, "SELECT COUNT(*) FROM users WHERE age > $1");
        let stmt = compile_count("users", &state, Some("id")).unwrap();
        assert_eq!(stmt.sql, "SELECT COUNT(id) FROM users WHERE age > $1");
    }

    #[test]
    fn insert_returns_id() {
        let rec = Record::new().set("username", "alice").set("age", 30i32);
        let stmt = compile_insert("users", &rec).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO users (username, age) VALUES ($1, $2) RETURNING id"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn insert_rejects_unset_columns() {
        let rec = Record::new().set("username", "alice").unset("email");
        let err = compile_insert("users", &rec).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn insert_bulk_flattens_row_major() {
        let records = vec![
            Record::new().set("a", 1i32).set("b", 2i32),
            Record::new().set("a", 3i32).set("b", 4i32),
        ];
        let stmt = compile_insert_bulk("pairs", &records).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO pairs (a, b) VALUES ($1, $2), ($3, $4)"
        );
        assert_eq!(stmt.params.len(), 4);
    }

    #[test]
    fn insert_bulk_follows_first_record_column_order() {
        let records = vec![
            Record::new().set("a", 1i32).set("b", 2i32),
            Record::new().set("b", 4i32).set("a", 3i32),
        ];
        let stmt = compile_insert_bulk("pairs", &records).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO pairs (a, b) VALUES ($1, $2), ($3, $4)"
        );
    }

    #[test]
    fn insert_bulk_names_the_offending_row_and_column() {
        let records = vec![
            Record::new().set("a", 1i32).set("b", 2i32),
            Record::new().set("a", 3i32).set("c", 4i32),
        ];
        let err = compile_insert_bulk("pairs", &records).unwrap_err();
        assert!(err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("record 1"));
        assert!(msg.contains("'b'"));
    }

    #[test]
    fn insert_bulk_rejects_empty_input() {
        let err = compile_insert_bulk("pairs", &[]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn update_set_params_precede_where_params() {
        let state = state_with(vec!["id = ?"], 1);
        let rec = Record::new().set("username", "bob").set("age", 31i32);
        let stmt = compile_update("users", &state, &rec).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE users SET username = $1, age = $2 WHERE id = $3"
        );
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn update_without_predicates_is_rejected() {
        let rec = Record::new().set("username", "bob");
        let err = compile_update("users", &QueryState::default(), &rec).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn delete_without_predicates_is_rejected() {
        let err = compile_delete("users", &QueryState::default()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn delete_renders_where() {
        let state = state_with(vec!["id = ?"], 1);
        let stmt = compile_delete("users", &state).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM users WHERE id = $1");
    }

    #[test]
    fn truncate_has_no_params() {
        let stmt = compile_truncate("users");
        assert_eq!(stmt.sql, "TRUNCATE TABLE users");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn deferred_build_error_surfaces_at_compile() {
        let mut state = QueryState::default();
        state.build_error = Some("operator '~~' is not allowed in a predicate".into());
        let err = compile_select("users", &state).unwrap_err();
        assert!(err.is_validation());
    }
}
