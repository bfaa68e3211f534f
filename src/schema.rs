//! Schema checker: per-field rules compiled once into a reusable `Checker`.
//!
//! `compile` turns a static field list into a `Checker` (regexes built
//! up front); `parse` validates a JSON body and returns only the declared
//! fields, so downstream SQL building never sees unknown keys.

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Declarative rule for one field. Const-buildable so table modules can
/// declare field lists as statics.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub required: bool,
    pub integer: bool,
    pub nullable: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<&'static str>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub date_time: bool,
}

impl FieldRule {
    pub const fn text() -> Self {
        FieldRule {
            required: false,
            integer: false,
            nullable: false,
            min_length: None,
            max_length: None,
            pattern: None,
            minimum: None,
            maximum: None,
            date_time: false,
        }
    }

    pub const fn integer() -> Self {
        let mut rule = Self::text();
        rule.integer = true;
        rule
    }

    pub const fn date_time() -> Self {
        let mut rule = Self::text();
        rule.date_time = true;
        rule
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn min_len(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub const fn max_len(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub const fn matching(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub const fn minimum(mut self, n: i64) -> Self {
        self.minimum = Some(n);
        self
    }

    pub const fn maximum(mut self, n: i64) -> Self {
        self.maximum = Some(n);
        self
    }
}

struct CompiledField {
    name: &'static str,
    rule: FieldRule,
    pattern: Option<Regex>,
}

/// A compiled, reusable validator for one table's writable fields.
pub struct Checker {
    fields: Vec<CompiledField>,
}

/// Compile a field list into a `Checker`. Panics on an invalid declared
/// pattern; field lists are static so this is a startup-time failure.
pub fn compile(fields: &'static [(&'static str, FieldRule)]) -> Checker {
    Checker {
        fields: fields
            .iter()
            .map(|&(name, rule)| CompiledField {
                name,
                rule,
                pattern: rule
                    .pattern
                    .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("bad pattern for {name}: {e}"))),
            })
            .collect(),
    }
}

impl Checker {
    /// Validate a full object. Required fields must be present; unknown keys
    /// are dropped. Returns the declared fields only, in declaration order.
    pub fn parse(&self, value: &Value) -> Result<Map<String, Value>, ValidationError> {
        let obj = as_object(value)?;
        let mut out = Map::new();
        for field in &self.fields {
            match obj.get(field.name) {
                None => {
                    if field.rule.required {
                        return Err(ValidationError::new(field.name, "is required"));
                    }
                }
                Some(Value::Null) if field.rule.required && !field.rule.nullable => {
                    return Err(ValidationError::new(field.name, "is required"));
                }
                Some(v) => {
                    check_field(field, v)?;
                    out.insert(field.name.to_string(), v.clone());
                }
            }
        }
        Ok(out)
    }

    /// Validate an array of objects, prefixing the failing index.
    pub fn parse_array(&self, value: &Value) -> Result<Vec<Map<String, Value>>, ValidationError> {
        let items = value
            .as_array()
            .ok_or_else(|| ValidationError::new("$", "expected a JSON array"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.parse(item)
                    .map_err(|e| ValidationError::new(format!("[{i}].{}", e.field), e.message))
            })
            .collect()
    }

    /// Validate only the fields present; required is not enforced. Used for
    /// partial updates.
    pub fn parse_partial(&self, value: &Value) -> Result<Map<String, Value>, ValidationError> {
        let obj = as_object(value)?;
        let mut out = Map::new();
        for field in &self.fields {
            if let Some(v) = obj.get(field.name) {
                check_field(field, v)?;
                out.insert(field.name.to_string(), v.clone());
            }
        }
        Ok(out)
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::new("$", "expected a JSON object"))
}

fn check_field(field: &CompiledField, v: &Value) -> Result<(), ValidationError> {
    let name = field.name;
    if v.is_null() {
        if field.rule.nullable {
            return Ok(());
        }
        return Err(ValidationError::new(name, "must not be null"));
    }
    if field.rule.integer {
        let n = v
            .as_i64()
            .ok_or_else(|| ValidationError::new(name, "must be an integer"))?;
        if let Some(min) = field.rule.minimum {
            if n < min {
                return Err(ValidationError::new(name, format!("must be at least {min}")));
            }
        }
        if let Some(max) = field.rule.maximum {
            if n > max {
                return Err(ValidationError::new(name, format!("must be at most {max}")));
            }
        }
        return Ok(());
    }
    let s = v
        .as_str()
        .ok_or_else(|| ValidationError::new(name, "must be a string"))?;
    if let Some(min) = field.rule.min_length {
        if s.chars().count() < min {
            return Err(ValidationError::new(
                name,
                format!("must be at least {min} characters"),
            ));
        }
    }
    if let Some(max) = field.rule.max_length {
        if s.chars().count() > max {
            return Err(ValidationError::new(
                name,
                format!("must be at most {max} characters"),
            ));
        }
    }
    if let Some(re) = &field.pattern {
        if !re.is_match(s) {
            return Err(ValidationError::new(name, "does not match required pattern"));
        }
    }
    if field.rule.date_time && chrono::DateTime::parse_from_rfc3339(s).is_err() {
        return Err(ValidationError::new(name, "must be an RFC 3339 date-time"));
    }
    Ok(())
}
