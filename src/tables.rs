//! Table declarations: marker types, domain columns, checkers, and DDL.
//!
//! Every table carries the four metadata columns (`id`, `created`, `updated`,
//! `note`) plus its declared domain columns. `updated` is refreshed by a
//! trigger on any domain-column update, so `updated >= created` holds without
//! handler cooperation.

use crate::schema::{compile, Checker, FieldRule};
use std::sync::OnceLock;

/// One domain column: name plus its DDL tail (type and constraints).
pub struct ColumnDef {
    pub name: &'static str,
    pub ddl: &'static str,
}

const fn col(name: &'static str, ddl: &'static str) -> ColumnDef {
    ColumnDef { name, ddl }
}

/// Metadata columns present on every table, in declared order.
pub const META_COLUMNS: &[&str] = &["id", "created", "updated", "note"];

/// Upper bound for surrogate keys; ids are u32-range by declaration.
pub const MAX_ID: i64 = 0xffff_ffff;

/// A declared table. Implemented only by the five marker types below; the
/// statement builder uses the marker as a phantom tag on select fragments.
pub trait Table: 'static {
    const NAME: &'static str;
    /// Domain columns in declared order (metadata columns excluded).
    const COLUMNS: &'static [ColumnDef];
    /// Composite UNIQUE constraints.
    const UNIQUE: &'static [&'static [&'static str]] = &[];
    /// Writable-field rules for request bodies (`id`/`created`/`updated` are
    /// server-assigned and never writable).
    const FIELDS: &'static [(&'static str, FieldRule)];

    fn checker() -> &'static Checker;
}

macro_rules! table_checker {
    () => {
        fn checker() -> &'static Checker {
            static CHECKER: OnceLock<Checker> = OnceLock::new();
            CHECKER.get_or_init(|| compile(Self::FIELDS))
        }
    };
}

const NOTE_RULE: (&str, FieldRule) = ("note", FieldRule::text());
const ID_REF: FieldRule = FieldRule::integer().required().minimum(0).maximum(MAX_ID);

pub struct Person;

impl Table for Person {
    const NAME: &'static str = "person";
    const COLUMNS: &'static [ColumnDef] = &[
        col("name", "VARCHAR(255)"),
        col("info", "TEXT NOT NULL"),
    ];
    const FIELDS: &'static [(&'static str, FieldRule)] = &[
        NOTE_RULE,
        ("name", FieldRule::text().required().min_len(1).max_len(255)),
        ("info", FieldRule::text().required().matching("^\\{.*\\}$")),
    ];
    table_checker!();
}

pub struct Course;

impl Table for Course {
    const NAME: &'static str = "course";
    const COLUMNS: &'static [ColumnDef] = &[
        col("name", "VARCHAR(255)"),
        col("info", "TEXT NOT NULL"),
    ];
    const FIELDS: &'static [(&'static str, FieldRule)] = &[
        NOTE_RULE,
        ("name", FieldRule::text().required().min_len(1).max_len(255)),
        ("info", FieldRule::text().required().matching("^\\{.*\\}$")),
    ];
    table_checker!();
}

pub struct Family;

impl Table for Family {
    const NAME: &'static str = "family";
    const COLUMNS: &'static [ColumnDef] = &[
        col(
            "upper",
            "INTEGER NOT NULL REFERENCES person(id) DEFERRABLE INITIALLY DEFERRED",
        ),
        col(
            "lower",
            "INTEGER NOT NULL REFERENCES person(id) DEFERRABLE INITIALLY DEFERRED",
        ),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["upper", "lower"]];
    const FIELDS: &'static [(&'static str, FieldRule)] = &[
        NOTE_RULE,
        ("upper", ID_REF),
        ("lower", ID_REF),
    ];
    table_checker!();
}

pub struct Signup;

impl Table for Signup {
    const NAME: &'static str = "signup";
    const COLUMNS: &'static [ColumnDef] = &[
        col(
            "course",
            "INTEGER NOT NULL REFERENCES course(id) DEFERRABLE INITIALLY DEFERRED",
        ),
        col(
            "person",
            "INTEGER NOT NULL REFERENCES person(id) DEFERRABLE INITIALLY DEFERRED",
        ),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["course", "person"]];
    const FIELDS: &'static [(&'static str, FieldRule)] = &[
        NOTE_RULE,
        ("course", ID_REF),
        ("person", ID_REF),
    ];
    table_checker!();
}

pub struct Record;

impl Table for Record {
    const NAME: &'static str = "record";
    const COLUMNS: &'static [ColumnDef] = &[
        col(
            "signup",
            "INTEGER NOT NULL REFERENCES signup(id) DEFERRABLE INITIALLY DEFERRED",
        ),
        col("began", "TIMESTAMP"),
        col("ended", "TIMESTAMP"),
    ];
    const FIELDS: &'static [(&'static str, FieldRule)] = &[
        NOTE_RULE,
        ("signup", ID_REF),
        ("began", FieldRule::date_time().nullable()),
        ("ended", FieldRule::date_time().nullable()),
    ];
    table_checker!();
}

/// CREATE TABLE + updated-timestamp trigger for one table.
pub fn create_sql<T: Table>() -> String {
    let mut defs = vec![
        "id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL".to_string(),
        "created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string(),
        "updated TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string(),
        "note TEXT NOT NULL DEFAULT ''".to_string(),
    ];
    for c in T::COLUMNS {
        defs.push(format!("{} {}", c.name, c.ddl));
    }
    for unique in T::UNIQUE {
        defs.push(format!("UNIQUE ({})", unique.join(", ")));
    }
    let tracked: Vec<&str> = T::COLUMNS.iter().map(|c| c.name).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {name} (\n  {defs}\n);\n\
         CREATE TRIGGER IF NOT EXISTS update_timestamp_{name}\n\
         AFTER UPDATE OF {tracked} ON {name}\n\
         BEGIN\n  UPDATE {name} SET updated = CURRENT_TIMESTAMP WHERE id = NEW.id;\nEND;",
        name = T::NAME,
        defs = defs.join(",\n  "),
        tracked = tracked.join(", "),
    )
}

/// DDL for the whole schema, creation order following foreign-key
/// dependencies.
pub fn create_all_sql() -> String {
    [
        create_sql::<Person>(),
        create_sql::<Course>(),
        create_sql::<Signup>(),
        create_sql::<Family>(),
        create_sql::<Record>(),
    ]
    .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_ddl_has_metadata_columns_and_trigger() {
        let sql = create_sql::<Person>();
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL"));
        assert!(sql.contains("note TEXT NOT NULL DEFAULT ''"));
        assert!(sql.contains("CREATE TRIGGER IF NOT EXISTS update_timestamp_person"));
        assert!(sql.contains("AFTER UPDATE OF name, info ON person"));
    }

    #[test]
    fn family_ddl_has_deferred_fks_and_unique_pair() {
        let sql = create_sql::<Family>();
        assert!(sql.contains("REFERENCES person(id) DEFERRABLE INITIALLY DEFERRED"));
        assert!(sql.contains("UNIQUE (upper, lower)"));
    }

    #[test]
    fn schema_covers_all_five_tables() {
        let sql = create_all_sql();
        for name in ["person", "course", "family", "signup", "record"] {
            assert!(sql.contains(&format!("CREATE TABLE IF NOT EXISTS {name}")));
        }
    }
}
