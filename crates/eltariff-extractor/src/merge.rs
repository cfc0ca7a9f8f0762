//! Merging per-source candidates into one tariff model
//!
//! Candidates are combined field by field on their wire form, guided by the
//! schema descriptor, and the combined document is validated like any single
//! extraction. Higher-priority sources win; a non-default value beats a
//! default one whatever its source. Every value that loses is reported as an
//! [`Alternative`].

use crate::config::{ExtractorConfig, TieBreak};
use crate::error::ExtractorError;
use eltariff_domain::schema::{FieldDefault, FieldKind, FieldSpec, ObjectSpec};
use eltariff_domain::{ActivePeriod, SchemaDescriptor, SourceKind, TariffModel};
use eltariff_gatekeeper::Gatekeeper;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A value that lost a merge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    /// Wire path of the field in the merged document
    pub path: String,
    /// Value kept
    pub kept: Value,
    /// Source the kept value came from
    pub kept_source: SourceKind,
    /// Value discarded
    pub discarded: Value,
    /// Source the discarded value came from
    pub source: SourceKind,
}

/// Sources of equal priority disagreeing on a normative field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeConflict {
    /// Wire path of the field
    pub path: String,
    /// Every value seen, with its source
    pub values: Vec<(SourceKind, Value)>,
}

/// Result of a successful merge
#[derive(Debug, Clone)]
pub struct Merged {
    /// The validated combined model
    pub model: TariffModel,
    /// Normalization notes from validating the combined model
    pub notes: Vec<String>,
    /// Values that lost
    pub alternatives: Vec<Alternative>,
}

/// Combines candidates by source priority
#[derive(Debug, Clone)]
pub struct MergeResolver {
    config: ExtractorConfig,
    gatekeeper: Gatekeeper,
}

impl MergeResolver {
    /// Create a resolver using the priority order and tie policy of `config`
    pub fn new(config: ExtractorConfig, gatekeeper: Gatekeeper) -> Self {
        Self { config, gatekeeper }
    }

    /// Merge candidates into one validated model
    pub fn merge(&self, mut candidates: Vec<(SourceKind, TariffModel)>) -> Result<Merged, ExtractorError> {
        if candidates.is_empty() {
            return Err(ExtractorError::InvalidRequest("nothing to merge".to_string()));
        }
        candidates.sort_by_key(|(kind, _)| self.config.priority_of(*kind));

        let descriptor = SchemaDescriptor::for_version(&candidates[0].1.schema_version)
            .unwrap_or_else(SchemaDescriptor::current);
        let root = descriptor.root();

        let mut documents = Vec::with_capacity(candidates.len());
        for (kind, model) in &candidates {
            let value = model
                .to_value()
                .map_err(|e| ExtractorError::InvalidRequest(format!("cannot serialize {} candidate: {}", kind, e)))?;
            documents.push((*kind, value));
        }

        let mut documents = documents.into_iter();
        let Some((base, mut combined)) = documents.next() else {
            return Err(ExtractorError::InvalidRequest("nothing to merge".to_string()));
        };

        let mut state = MergeState {
            descriptor,
            config: &self.config,
            base,
            origins: BTreeMap::new(),
            alternatives: Vec::new(),
            conflicts: Vec::new(),
        };

        for (source, document) in documents {
            debug!(%source, "Merging candidate");
            if let (Value::Object(kept), Value::Object(incoming)) = (&mut combined, &document) {
                state.merge_object(root, kept, incoming, "", source);
            }
        }

        let MergeState {
            alternatives,
            conflicts,
            ..
        } = state;

        if !conflicts.is_empty() {
            return Err(ExtractorError::MergeConflictUnresolved { conflicts });
        }

        let validated = self
            .gatekeeper
            .validate(&combined)
            .map_err(|report| ExtractorError::SchemaValidationFailed {
                report,
                raw_output: None,
            })?;

        info!(
            candidates = candidates.len(),
            alternatives = alternatives.len(),
            "Merged candidates"
        );

        Ok(Merged {
            model: validated.model,
            notes: validated.notes,
            alternatives,
        })
    }
}

struct MergeState<'c> {
    descriptor: &'static SchemaDescriptor,
    config: &'c ExtractorConfig,
    base: SourceKind,
    // paths whose value came from a later candidate
    origins: BTreeMap<String, SourceKind>,
    alternatives: Vec<Alternative>,
    conflicts: Vec<MergeConflict>,
}

impl MergeState<'_> {
    fn merge_object(
        &mut self,
        object: &'static ObjectSpec,
        kept: &mut Map<String, Value>,
        incoming: &Map<String, Value>,
        path: &str,
        source: SourceKind,
    ) {
        for (key, value) in incoming {
            let field_path = join(path, key);
            let field = object.field(key);

            if !kept.contains_key(key) {
                kept.insert(key.clone(), value.clone());
                self.origins.insert(field_path, source);
                continue;
            }
            let Some(slot) = kept.get_mut(key) else {
                continue;
            };

            match field {
                // the highest-priority candidate names the object
                Some(field) if field.wire == "id" => {}
                Some(field) => match field.kind {
                    FieldKind::ObjectArray(name) => match (slot, value) {
                        (Value::Array(kept_items), Value::Array(new_items)) => {
                            self.merge_array(name, kept_items, new_items, &field_path, source)
                        }
                        (slot, value) => self.merge_value(Some(field), slot, value, &field_path, source),
                    },
                    FieldKind::Object(name) => {
                        let descriptor = self.descriptor;
                        let nested = descriptor.object(name).filter(|o| o.extensible);
                        match (nested, slot, value) {
                            (Some(nested), Value::Object(kept), Value::Object(incoming)) => {
                                self.merge_object(nested, kept, incoming, &field_path, source)
                            }
                            (_, slot, value) => self.merge_value(Some(field), slot, value, &field_path, source),
                        }
                    }
                    FieldKind::StringArray if field.informational => union(slot, value),
                    _ => self.merge_value(Some(field), slot, value, &field_path, source),
                },
                None => self.merge_value(None, slot, value, &field_path, source),
            }
        }
    }

    fn merge_array(
        &mut self,
        name: &str,
        kept_items: &mut Vec<Value>,
        new_items: &[Value],
        path: &str,
        source: SourceKind,
    ) {
        let descriptor = self.descriptor;
        let object = descriptor.object(name);
        let original_len = kept_items.len();
        let mut matched = vec![false; original_len];

        for item in new_items {
            let key = item_key(name, item);
            let found = (0..original_len).find(|&i| !matched[i] && item_key(name, &kept_items[i]) == key);

            if let Some(i) = found {
                matched[i] = true;
                let item_path = format!("{}[{}]", path, i);
                match (object, &mut kept_items[i], item) {
                    (Some(object), Value::Object(kept), Value::Object(incoming)) => {
                        self.merge_object(object, kept, incoming, &item_path, source)
                    }
                    (_, kept, item) => self.merge_value(None, kept, item, &item_path, source),
                }
                continue;
            }

            if name == "ActivePeriod" {
                if let Some(i) = overlapping_window(&kept_items[..original_len], item) {
                    let item_path = format!("{}[{}]", path, i);
                    self.lose(&item_path, &kept_items[i].clone(), item, source, true);
                    continue;
                }
            }

            let item_path = format!("{}[{}]", path, kept_items.len());
            kept_items.push(item.clone());
            self.origins.insert(item_path, source);
        }
    }

    fn merge_value(
        &mut self,
        field: Option<&FieldSpec>,
        slot: &mut Value,
        incoming: &Value,
        path: &str,
        source: SourceKind,
    ) {
        if slot == incoming || is_default(field, incoming) {
            return;
        }

        if is_default(field, slot) {
            let kept_source = self.origin_of(path);
            let discarded = std::mem::replace(slot, incoming.clone());
            self.origins.insert(path.to_string(), source);
            self.alternatives.push(Alternative {
                path: path.to_string(),
                kept: incoming.clone(),
                kept_source: source,
                discarded,
                source: kept_source,
            });
            return;
        }

        let normative = field.is_some_and(|f| !f.informational);
        let kept = slot.clone();
        self.lose(path, &kept, incoming, source, normative);
    }

    // Record `discarded` losing to `kept`, or a conflict when neither can win
    fn lose(&mut self, path: &str, kept: &Value, discarded: &Value, source: SourceKind, normative: bool) {
        let kept_source = self.origin_of(path);
        let tie = self.config.priority_of(kept_source) == self.config.priority_of(source);

        if tie && normative && self.config.tie_break == TieBreak::Fail {
            self.conflicts.push(MergeConflict {
                path: path.to_string(),
                values: vec![(kept_source, kept.clone()), (source, discarded.clone())],
            });
            return;
        }

        self.alternatives.push(Alternative {
            path: path.to_string(),
            kept: kept.clone(),
            kept_source,
            discarded: discarded.clone(),
            source,
        });
    }

    fn origin_of(&self, path: &str) -> SourceKind {
        self.origins
            .iter()
            .filter(|(prefix, _)| is_path_prefix(prefix, path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, source)| *source)
            .unwrap_or(self.base)
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn is_path_prefix(prefix: &str, path: &str) -> bool {
    path == prefix
        || (path.starts_with(prefix) && matches!(path.as_bytes().get(prefix.len()), Some(b'.') | Some(b'[')))
}

fn is_default(field: Option<&FieldSpec>, value: &Value) -> bool {
    if value.is_null() {
        return true;
    }
    match field.and_then(|f| f.default) {
        Some(FieldDefault::Text(text)) => value.as_str() == Some(text),
        Some(FieldDefault::Integer(n)) => value.as_i64() == Some(n),
        Some(FieldDefault::EmptyList) => value.as_array().is_some_and(|items| items.is_empty()),
        Some(FieldDefault::Derived) | None => false,
    }
}

fn union(slot: &mut Value, incoming: &Value) {
    let (Value::Array(kept), Value::Array(new_items)) = (slot, incoming) else {
        return;
    };
    for item in new_items {
        if !kept.contains(item) {
            kept.push(item.clone());
        }
    }
}

fn text_key(item: &Value, field: &str) -> String {
    item.get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default()
}

// Items with equal keys describe the same thing
fn item_key(object: &str, item: &Value) -> String {
    match object {
        "Tariff" => text_key(item, "name"),
        // seasonal variants share a name
        "PriceComponent" => format!(
            "{}|{}",
            text_key(item, "name"),
            item.get("validPeriod").map(Value::to_string).unwrap_or_default()
        ),
        "RecurringPeriod" | "CalendarPattern" => text_key(item, "reference"),
        "ActivePeriod" => match serde_json::from_value::<ActivePeriod>(item.clone()) {
            Ok(window) => format!(
                "{}|{}|{:?}",
                window.from_including,
                window.to_excluding,
                window.calendar_key()
            ),
            Err(_) => item.to_string(),
        },
        _ => item.to_string(),
    }
}

fn overlapping_window(kept: &[Value], item: &Value) -> Option<usize> {
    let window: ActivePeriod = serde_json::from_value(item.clone()).ok()?;
    kept.iter().position(|other| {
        serde_json::from_value::<ActivePeriod>(other.clone())
            .is_ok_and(|other| other.calendar_key() == window.calendar_key() && other.overlaps(&window))
    })
}
