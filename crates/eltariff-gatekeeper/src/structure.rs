//! Structural validation driven by the schema descriptor
//!
//! Checks presence and primitive types only. Every violation is collected;
//! the walk never stops early.

use crate::paths::{index, join};
use crate::ValidationConfig;
use chrono::{DateTime, NaiveDate, NaiveTime};
use eltariff_domain::schema::{FieldKind, FieldSpec, ObjectSpec, SchemaDescriptor};
use eltariff_domain::{Violation, ViolationCode};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(\d+Y)?(\d+M)?(\d+W)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").unwrap()
});

/// Whether text is a well-formed ISO 8601 duration such as `P1M` or `PT15M`
pub fn is_iso_duration(text: &str) -> bool {
    text.len() > 1 && !text.ends_with('T') && ISO_DURATION.is_match(text)
}

/// Walks a document against a descriptor
pub(crate) struct StructureCheck<'a> {
    descriptor: &'a SchemaDescriptor,
    config: &'a ValidationConfig,
    violations: Vec<Violation>,
    notes: Vec<String>,
}

impl<'a> StructureCheck<'a> {
    pub(crate) fn new(descriptor: &'a SchemaDescriptor, config: &'a ValidationConfig) -> Self {
        Self {
            descriptor,
            config,
            violations: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Check a whole document; returns violations and notes about kept extensions
    pub(crate) fn run(mut self, document: &Value) -> (Vec<Violation>, Vec<String>) {
        let descriptor = self.descriptor;
        self.check_object(descriptor.root(), document, "");
        self.check_non_empty_tariffs(document);
        (self.violations, self.notes)
    }

    fn violation(&mut self, path: &str, code: ViolationCode, message: impl Into<String>) {
        self.violations.push(Violation::new(path, code, message));
    }

    fn check_non_empty_tariffs(&mut self, document: &Value) {
        if let Some(Value::Array(tariffs)) = document.get("tariffs") {
            if tariffs.is_empty() {
                self.violation("tariffs", ViolationCode::MissingField, "at least one tariff is required");
            }
        }
    }

    fn check_object(&mut self, spec: &ObjectSpec, value: &Value, path: &str) {
        let Value::Object(map) = value else {
            self.violation(path, ViolationCode::WrongType, format!("expected {} object", spec.name));
            return;
        };

        for field in spec.fields {
            let child = join(path, field.wire);
            match map.get(field.wire) {
                None if field.required => {
                    self.violation(&child, ViolationCode::MissingField, "required field is missing")
                }
                None => {}
                Some(value) => self.check_field(field, value, &child),
            }
        }

        for key in map.keys().filter(|k| spec.field(k).is_none()) {
            let child = join(path, key);
            if spec.extensible && self.config.allow_extensions {
                self.notes.push(format!("{}: kept as extension", child));
            } else if spec.extensible {
                self.violation(&child, ViolationCode::UnknownField, "extensions are not allowed");
            } else {
                self.violation(
                    &child,
                    ViolationCode::UnknownField,
                    format!("{} does not allow extra fields", spec.name),
                );
            }
        }
    }

    fn check_field(&mut self, field: &FieldSpec, value: &Value, path: &str) {
        let descriptor = self.descriptor;
        match field.kind {
            FieldKind::String => {
                if !value.is_string() {
                    self.violation(path, ViolationCode::WrongType, "expected string");
                }
            }
            FieldKind::Number => {
                if !value.is_number() {
                    self.violation(path, ViolationCode::WrongType, "expected number");
                }
            }
            FieldKind::Integer => {
                if value.as_u64().is_none() {
                    self.violation(path, ViolationCode::WrongType, "expected non-negative integer");
                }
            }
            FieldKind::Date => self.check_date(value, path),
            FieldKind::Time => {
                let valid = value
                    .as_str()
                    .is_some_and(|s| NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok());
                if !valid {
                    self.violation(path, ViolationCode::WrongType, "expected time HH:MM:SS");
                }
            }
            FieldKind::DateTime => {
                let valid = value
                    .as_str()
                    .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
                if !valid {
                    self.violation(path, ViolationCode::WrongType, "expected RFC 3339 timestamp");
                }
            }
            FieldKind::Duration => match value.as_str() {
                Some(s) if is_iso_duration(s) => {}
                Some(s) => self.violation(
                    path,
                    ViolationCode::InvalidDuration,
                    format!("\"{}\" is not an ISO 8601 duration", s),
                ),
                None => self.violation(path, ViolationCode::WrongType, "expected duration string"),
            },
            FieldKind::Enum(values) => match value.as_str() {
                Some(s) if values.iter().any(|v| *v == s) => {}
                Some(s) => self.violation(
                    path,
                    ViolationCode::InvalidEnum,
                    format!("\"{}\" is not one of {}", s, values.join(", ")),
                ),
                None => self.violation(path, ViolationCode::WrongType, "expected string"),
            },
            FieldKind::Object(name) => {
                if let Some(spec) = descriptor.object(name) {
                    self.check_object(spec, value, path);
                }
            }
            FieldKind::ObjectArray(name) => {
                let Some(items) = value.as_array() else {
                    self.violation(path, ViolationCode::WrongType, format!("expected list of {}", name));
                    return;
                };
                if let Some(spec) = descriptor.object(name) {
                    for (i, item) in items.iter().enumerate() {
                        self.check_object(spec, item, &index(path, i));
                    }
                }
            }
            FieldKind::StringArray => self.check_array(value, path, "string", Value::is_string),
            FieldKind::IntegerArray => {
                self.check_array(value, path, "integer", |v| v.as_u64().is_some())
            }
            FieldKind::DateArray => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        self.check_date(item, &index(path, i));
                    }
                }
                None => self.violation(path, ViolationCode::WrongType, "expected list of dates"),
            },
        }
    }

    fn check_date(&mut self, value: &Value, path: &str) {
        let valid = value
            .as_str()
            .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok());
        if !valid {
            self.violation(path, ViolationCode::WrongType, "expected date YYYY-MM-DD");
        }
    }

    fn check_array(&mut self, value: &Value, path: &str, item: &str, check: fn(&Value) -> bool) {
        match value.as_array() {
            Some(items) => {
                for (i, v) in items.iter().enumerate() {
                    if !check(v) {
                        self.violation(&index(path, i), ViolationCode::WrongType, format!("expected {}", item));
                    }
                }
            }
            None => self.violation(path, ViolationCode::WrongType, format!("expected list of {}s", item)),
        }
    }
}
