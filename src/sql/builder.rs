//! Parameterized statement builder with tagged select fragments.
//!
//! `Statement` is a flat SQL string plus positional arguments; the placeholder
//! count always equals `args.len()`. `Select<T>` is a fragment tagged with its
//! source table marker: join combinators are only defined on the matching tag,
//! so a fragment for one table cannot be glued into another table's join.

use crate::sql::params::BindValue;
use crate::tables::Table;
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// A complete, executable parameterized statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<BindValue>,
}

/// A `SELECT ... FROM table` fragment tagged with its source table.
///
/// The tag is compile-time only:
///
/// ```compile_fail
/// use rollbook::sql::select_all;
/// use rollbook::tables::Course;
///
/// // `lowers_of` joins through `family`, which relates persons; a course
/// // fragment must not be accepted.
/// let _ = select_all::<Course>().lowers_of(1);
/// ```
pub struct Select<T: Table> {
    sql: String,
    args: Vec<BindValue>,
    _table: PhantomData<fn() -> T>,
}

/// Columns a request body may write: `note` plus the domain columns, in
/// declared order. `id`/`created`/`updated` are server-assigned.
pub fn writable_columns<T: Table>() -> Vec<&'static str> {
    std::iter::once("note")
        .chain(T::COLUMNS.iter().map(|c| c.name))
        .collect()
}

/// Multi-row INSERT. Rows are assumed to already satisfy the table's checked
/// schema; no validation happens here. A missing `note` binds `''`, any other
/// missing value binds NULL. Placeholder count = rows.len() x columns.len().
pub fn insert<T: Table>(rows: &[Map<String, Value>]) -> Statement {
    let columns = writable_columns::<T>();
    let row_placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![row_placeholders; rows.len()].join(", ");
    let args = rows
        .iter()
        .flat_map(|row| {
            columns.iter().map(|col| match row.get(*col) {
                Some(v) => BindValue::from_json(v),
                None if *col == "note" => BindValue::Text(String::new()),
                None => BindValue::Null,
            })
        })
        .collect();
    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES {}",
            T::NAME,
            columns.join(", "),
            values
        ),
        args,
    }
}

/// Tagged `SELECT <qualified columns> FROM <table>` with no trailing filter.
/// Included columns appear in mask order; flagged-off or absent columns are
/// excluded. An all-false mask selects nothing, which is the caller's error.
pub fn select<T: Table>(mask: &[(&str, bool)]) -> Select<T> {
    let selected: Vec<String> = mask
        .iter()
        .filter(|(_, include)| *include)
        .map(|(name, _)| format!("{}.{}", T::NAME, name))
        .collect();
    Select {
        sql: format!("SELECT {} FROM {}", selected.join(", "), T::NAME),
        args: Vec::new(),
        _table: PhantomData,
    }
}

/// `select` over every column of the table (metadata plus domain).
pub fn select_all<T: Table>() -> Select<T> {
    let mask: Vec<(&str, bool)> = crate::tables::META_COLUMNS
        .iter()
        .chain(T::COLUMNS.iter().map(|c| &c.name))
        .map(|name| (*name, true))
        .collect();
    select::<T>(&mask)
}

/// UPDATE by id: SET only the columns present in `body`, in declared column
/// order. `body` must be non-empty and pre-validated; `updated` is refreshed
/// by the table trigger.
pub fn update<T: Table>(body: &Map<String, Value>, id: i64) -> Statement {
    let mut sets = Vec::new();
    let mut args = Vec::new();
    for col in writable_columns::<T>() {
        if let Some(v) = body.get(col) {
            sets.push(format!("{col} = ?"));
            args.push(BindValue::from_json(v));
        }
    }
    args.push(BindValue::Int(id));
    Statement {
        sql: format!(
            "UPDATE {name} SET {} WHERE {name}.id = ?",
            sets.join(", "),
            name = T::NAME
        ),
        args,
    }
}

/// DELETE matching every (column, value) pair.
pub fn delete_by<T: Table>(keys: &[(&str, i64)]) -> Statement {
    let clauses: Vec<String> = keys
        .iter()
        .map(|(col, _)| format!("{}.{} = ?", T::NAME, col))
        .collect();
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {}",
            T::NAME,
            clauses.join(" AND ")
        ),
        args: keys.iter().map(|(_, v)| BindValue::Int(*v)).collect(),
    }
}

/// DELETE by surrogate key.
pub fn delete<T: Table>(id: i64) -> Statement {
    delete_by::<T>(&[("id", id)])
}

impl<T: Table> Select<T> {
    /// Close the fragment with a `WHERE <table>.id = ?` filter.
    pub fn by_id(self, id: i64) -> Statement {
        let mut args = self.args;
        args.push(BindValue::Int(id));
        Statement {
            sql: format!("{} WHERE {}.id = ?", self.sql, T::NAME),
            args,
        }
    }

    /// Close the fragment as-is.
    pub fn into_statement(self) -> Statement {
        Statement {
            sql: self.sql,
            args: self.args,
        }
    }

    /// Append `INNER JOIN relation ON relation.filter_col = ? AND on_clause`,
    /// binding `key`. Callers fix the relation shape per tag.
    fn join_on(mut self, relation: &str, filter_col: &str, on_clause: &str, key: i64) -> Self {
        self.sql = format!(
            "{} INNER JOIN {relation} ON {relation}.{filter_col} = ? AND {on_clause}",
            self.sql
        );
        self.args.push(BindValue::Int(key));
        self
    }
}

impl Select<crate::tables::Person> {
    /// Persons below `upper` in the family relation.
    pub fn lowers_of(self, upper: i64) -> Self {
        self.join_on("family", "upper", "family.lower = person.id", upper)
    }

    /// Persons above `lower` in the family relation.
    pub fn uppers_of(self, lower: i64) -> Self {
        self.join_on("family", "lower", "family.upper = person.id", lower)
    }

    /// Persons signed up for `course`.
    pub fn enrolled_in(self, course: i64) -> Self {
        self.join_on("signup", "course", "signup.person = person.id", course)
    }
}

impl Select<crate::tables::Course> {
    /// Courses `person` is signed up for.
    pub fn taken_by(self, person: i64) -> Self {
        self.join_on("signup", "person", "signup.course = course.id", person)
    }
}

impl Select<crate::tables::Record> {
    /// Attendance records reachable from `person` through signup.
    pub fn for_person(self, person: i64) -> Self {
        self.join_on("signup", "person", "record.signup = signup.id", person)
    }

    /// Attendance records reachable from `course` through signup.
    pub fn for_course(self, course: i64) -> Self {
        self.join_on("signup", "course", "record.signup = signup.id", course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{Course, Family, Person, Record};
    use serde_json::json;

    fn row(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn select_includes_flagged_columns_in_mask_order() {
        let stmt = select::<Person>(&[
            ("info", true),
            ("name", false),
            ("id", true),
        ])
        .into_statement();
        assert_eq!(stmt.sql, "SELECT person.info, person.id FROM person");
        assert!(stmt.args.is_empty());
    }

    #[test]
    fn select_all_qualifies_metadata_and_domain_columns() {
        let stmt = select_all::<Course>().into_statement();
        assert_eq!(
            stmt.sql,
            "SELECT course.id, course.created, course.updated, course.note, \
             course.name, course.info FROM course"
        );
    }

    #[test]
    fn insert_builds_one_multi_row_statement() {
        let rows = vec![
            row(json!({"name": "a", "info": "{}", "note": "x"})),
            row(json!({"name": "b", "info": "{\"k\":1}"})),
        ];
        let stmt = insert::<Person>(&rows);
        assert_eq!(
            stmt.sql,
            "INSERT INTO person (note, name, info) VALUES (?, ?, ?), (?, ?, ?)"
        );
        // rows.len() x columns.len()
        assert_eq!(stmt.args.len(), 2 * 3);
        // chunks of column width reproduce the rows in declared order
        let chunks: Vec<&[BindValue]> = stmt.args.chunks(3).collect();
        assert_eq!(
            chunks[0],
            &[
                BindValue::Text("x".into()),
                BindValue::Text("a".into()),
                BindValue::Text("{}".into())
            ]
        );
        // missing note defaults to the empty string, never NULL
        assert_eq!(chunks[1][0], BindValue::Text(String::new()));
    }

    #[test]
    fn insert_missing_optional_value_binds_null() {
        let rows = vec![row(json!({"signup": 3}))];
        let stmt = insert::<Record>(&rows);
        assert_eq!(
            stmt.sql,
            "INSERT INTO record (note, signup, began, ended) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(
            stmt.args,
            vec![
                BindValue::Text(String::new()),
                BindValue::Int(3),
                BindValue::Null,
                BindValue::Null
            ]
        );
    }

    #[test]
    fn join_appends_clause_and_pushes_arg() {
        let stmt = select_all::<Person>().lowers_of(42).into_statement();
        assert!(stmt
            .sql
            .ends_with("FROM person INNER JOIN family ON family.upper = ? AND family.lower = person.id"));
        assert_eq!(stmt.args, vec![BindValue::Int(42)]);
    }

    #[test]
    fn joins_compose_in_order() {
        let stmt = select_all::<Record>().for_person(7).into_statement();
        assert!(stmt
            .sql
            .contains("INNER JOIN signup ON signup.person = ? AND record.signup = signup.id"));
        assert_eq!(stmt.args, vec![BindValue::Int(7)]);
    }

    #[test]
    fn by_id_binds_after_join_args() {
        let stmt = select_all::<Person>().lowers_of(1).by_id(2);
        assert!(stmt.sql.ends_with("WHERE person.id = ?"));
        assert_eq!(stmt.args, vec![BindValue::Int(1), BindValue::Int(2)]);
    }

    #[test]
    fn update_sets_only_present_columns() {
        let stmt = update::<Person>(&row(json!({"name": "n"})), 5);
        assert_eq!(stmt.sql, "UPDATE person SET name = ? WHERE person.id = ?");
        assert_eq!(
            stmt.args,
            vec![BindValue::Text("n".into()), BindValue::Int(5)]
        );
    }

    #[test]
    fn delete_by_joins_keys_with_and() {
        let stmt = delete_by::<Family>(&[("upper", 1), ("lower", 2)]);
        assert_eq!(
            stmt.sql,
            "DELETE FROM family WHERE family.upper = ? AND family.lower = ?"
        );
        assert_eq!(stmt.args, vec![BindValue::Int(1), BindValue::Int(2)]);
    }

    #[test]
    fn placeholder_count_matches_args() {
        let rows = vec![row(json!({"name": "a", "info": "{}"}))];
        for stmt in [
            insert::<Person>(&rows),
            update::<Person>(&row(json!({"note": "x"})), 1),
            delete::<Person>(9),
            select_all::<Person>().uppers_of(3).by_id(4),
        ] {
            let placeholders = stmt.sql.matches('?').count();
            assert_eq!(placeholders, stmt.args.len(), "sql: {}", stmt.sql);
        }
    }
}
