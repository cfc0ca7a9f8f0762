//! Schema descriptor - the single description of the tariff wire format
//!
//! One descriptor per supported schema version describes every object of a
//! tariff document: its fields, their internal and wire names, value kinds,
//! defaults, and whether unknown fields are accepted. The same descriptor
//! drives the extraction prompt, the structured-output contract given to the
//! model, structural validation, and the published OpenAPI document.
//!
//! Descriptors are process-wide statics. Derived forms (JSON Schema) are
//! built once on first use and shared read-only afterwards.

use crate::tariff::{ComponentType, Currency, Direction, Unit};
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

/// Schema version new documents are produced with
pub const CURRENT_SCHEMA_VERSION: &str = "0.1.0";

/// Kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    String,
    /// Decimal number
    Number,
    /// Non-negative integer
    Integer,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// Time of day, `HH:MM:SS`
    Time,
    /// RFC 3339 timestamp
    DateTime,
    /// ISO 8601 duration, e.g. `P1M`
    Duration,
    /// One of a closed set of strings
    Enum(&'static [&'static str]),
    /// Nested object, by object name
    Object(&'static str),
    /// List of nested objects, by object name
    ObjectArray(&'static str),
    /// List of strings
    StringArray,
    /// List of integers
    IntegerArray,
    /// List of dates
    DateArray,
}

impl FieldKind {
    /// Short label used in prompts
    pub fn label(&self) -> String {
        match self {
            FieldKind::String => "string".to_string(),
            FieldKind::Number => "number".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::Date => "date (YYYY-MM-DD)".to_string(),
            FieldKind::Time => "time (HH:MM:SS)".to_string(),
            FieldKind::DateTime => "timestamp (RFC 3339)".to_string(),
            FieldKind::Duration => "ISO 8601 duration".to_string(),
            FieldKind::Enum(values) => format!("one of {}", values.join(" | ")),
            FieldKind::Object(name) => name.to_string(),
            FieldKind::ObjectArray(name) => format!("list of {}", name),
            FieldKind::StringArray => "list of strings".to_string(),
            FieldKind::IntegerArray => "list of integers".to_string(),
            FieldKind::DateArray => "list of dates".to_string(),
        }
    }
}

/// Default applied when a field is absent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    /// Fixed text value
    Text(&'static str),
    /// Fixed integer value
    Integer(i64),
    /// Empty list
    EmptyList,
    /// Computed from other fields during normalization
    Derived,
}

/// One field of an object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Internal (snake_case) name
    pub name: &'static str,
    /// Public wire name
    pub wire: &'static str,
    /// Value kind
    pub kind: FieldKind,
    /// Must be present once normalized
    pub required: bool,
    /// Default applied when absent
    pub default: Option<FieldDefault>,
    /// Carries no pricing meaning; merge keeps the first value seen
    pub informational: bool,
    /// Meaning, units and constraints
    pub description: &'static str,
}

impl FieldSpec {
    /// Whether the model must supply the field itself
    pub fn model_must_supply(&self) -> bool {
        self.required && self.default.is_none()
    }
}

const fn required(
    name: &'static str,
    wire: &'static str,
    kind: FieldKind,
    description: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        wire,
        kind,
        required: true,
        default: None,
        informational: false,
        description,
    }
}

const fn defaulted(
    name: &'static str,
    wire: &'static str,
    kind: FieldKind,
    default: FieldDefault,
    description: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        wire,
        kind,
        required: true,
        default: Some(default),
        informational: false,
        description,
    }
}

const fn optional(
    name: &'static str,
    wire: &'static str,
    kind: FieldKind,
    description: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        wire,
        kind,
        required: false,
        default: None,
        informational: false,
        description,
    }
}

const fn informational(
    name: &'static str,
    wire: &'static str,
    kind: FieldKind,
    description: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        wire,
        kind,
        required: false,
        default: None,
        informational: true,
        description,
    }
}

/// One object of the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectSpec {
    /// Object name, also the OpenAPI component name
    pub name: &'static str,
    /// What the object represents
    pub description: &'static str,
    /// Fields in wire order
    pub fields: &'static [FieldSpec],
    /// Unknown fields are kept as extensions
    pub extensible: bool,
}

impl ObjectSpec {
    /// Look up a field by wire name
    pub fn field(&self, wire: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.wire == wire)
    }

    /// Look up a field by internal name
    pub fn field_by_name(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Wire name for an internal name
    pub fn wire_name(&self, name: &str) -> Option<&'static str> {
        self.field_by_name(name).map(|f| f.wire)
    }
}

/// Whether a JSON Schema describes model input or published output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// What the model must produce; defaulted fields are optional
    ModelOutput,
    /// What a normalized document contains; defaulted fields are present
    Published,
}

/// Full description of one schema version
#[derive(Debug)]
pub struct SchemaDescriptor {
    version: &'static str,
    root: &'static str,
    objects: &'static [ObjectSpec],
    model_schema: OnceLock<Value>,
}

const TARIFF_DOCUMENT_FIELDS: &[FieldSpec] = &[
    defaulted(
        "schema_version",
        "schemaVersion",
        FieldKind::String,
        FieldDefault::Text(CURRENT_SCHEMA_VERSION),
        "Schema version of the document",
    ),
    required(
        "tariffs",
        "tariffs",
        FieldKind::ObjectArray("Tariff"),
        "Every distinct tariff (product) found in the sources; at least one",
    ),
    defaulted(
        "calendar_patterns",
        "calendarPatterns",
        FieldKind::ObjectArray("CalendarPattern"),
        FieldDefault::Derived,
        "Day sets referenced by active periods; Swedish weekdays, weekends and holidays when absent",
    ),
    FieldSpec {
        informational: true,
        ..defaulted(
            "warnings",
            "warnings",
            FieldKind::StringArray,
            FieldDefault::EmptyList,
            "Caveats about ambiguous or missing information in the sources",
        )
    },
];

const TARIFF_FIELDS: &[FieldSpec] = &[
    defaulted(
        "id",
        "id",
        FieldKind::String,
        FieldDefault::Derived,
        "Stable tariff id; derived from operator id and tariff name when absent",
    ),
    required("name", "name", FieldKind::String, "Tariff name as published by the operator"),
    informational(
        "description",
        "description",
        FieldKind::String,
        "Target group, e.g. fuse size range for households",
    ),
    required(
        "valid_period",
        "validPeriod",
        FieldKind::Object("ValidPeriod"),
        "Period the tariff applies",
    ),
    defaulted(
        "time_zone",
        "timeZone",
        FieldKind::String,
        FieldDefault::Text("Europe/Stockholm"),
        "IANA time zone all time-of-day windows are expressed in",
    ),
    informational(
        "last_updated",
        "lastUpdated",
        FieldKind::DateTime,
        "When the operator last updated the tariff",
    ),
    required(
        "company_name",
        "companyName",
        FieldKind::String,
        "Grid operator display name",
    ),
    required(
        "company_org_no",
        "companyOrgNo",
        FieldKind::String,
        "Grid operator organisation number, NNNNNN-NNNN",
    ),
    informational("product", "product", FieldKind::String, "Product label"),
    defaulted(
        "direction",
        "direction",
        FieldKind::Enum(Direction::WIRE_VALUES),
        FieldDefault::Text("consumption"),
        "Energy flow the tariff prices",
    ),
    defaulted(
        "billing_period",
        "billingPeriod",
        FieldKind::Duration,
        FieldDefault::Text("P1M"),
        "How often the customer is billed",
    ),
    optional(
        "fixed_price",
        "fixedPrice",
        FieldKind::Object("PriceElement"),
        "Subscription fees, priced per pricedPeriod",
    ),
    optional(
        "energy_price",
        "energyPrice",
        FieldKind::Object("PriceElement"),
        "Transfer fees priced per kWh",
    ),
    optional(
        "power_price",
        "powerPrice",
        FieldKind::Object("PriceElement"),
        "Demand fees priced per kW",
    ),
];

const VALID_PERIOD_FIELDS: &[FieldSpec] = &[
    required("from_including", "fromIncluding", FieldKind::Date, "First day the period applies"),
    optional(
        "to_excluding",
        "toExcluding",
        FieldKind::Date,
        "First day the period no longer applies; open-ended when absent",
    ),
];

const PRICE_ELEMENT_FIELDS: &[FieldSpec] = &[
    defaulted(
        "id",
        "id",
        FieldKind::String,
        FieldDefault::Derived,
        "Stable element id; derived when absent",
    ),
    required("name", "name", FieldKind::String, "Element name"),
    informational("description", "description", FieldKind::String, "Free-text description"),
    optional(
        "cost_function",
        "costFunction",
        FieldKind::String,
        "Expression combining the component prices",
    ),
    required(
        "components",
        "components",
        FieldKind::ObjectArray("PriceComponent"),
        "Priced fees of this element; at least one",
    ),
];

const PRICE_COMPONENT_FIELDS: &[FieldSpec] = &[
    defaulted(
        "id",
        "id",
        FieldKind::String,
        FieldDefault::Derived,
        "Stable component id; derived when absent",
    ),
    required("name", "name", FieldKind::String, "Component name"),
    informational("description", "description", FieldKind::String, "Free-text description"),
    defaulted(
        "component_type",
        "type",
        FieldKind::Enum(ComponentType::WIRE_VALUES),
        FieldDefault::Text("fixed"),
        "How the price varies",
    ),
    defaulted(
        "reference",
        "reference",
        FieldKind::String,
        FieldDefault::Text("main"),
        "Meter reference",
    ),
    optional(
        "valid_period",
        "validPeriod",
        FieldKind::Object("ValidPeriod"),
        "Seasonal window inside the tariff validity, e.g. winter months",
    ),
    required("price", "price", FieldKind::Object("Price"), "Price of one unit"),
    optional(
        "unit",
        "unit",
        FieldKind::Enum(Unit::WIRE_VALUES),
        "kWh for energy prices, kW for power prices; absent for fixed fees",
    ),
    optional(
        "priced_period",
        "pricedPeriod",
        FieldKind::Duration,
        "Period a fixed fee covers, e.g. P1Y for an annual fee",
    ),
    defaulted(
        "recurring_periods",
        "recurringPeriods",
        FieldKind::ObjectArray("RecurringPeriod"),
        FieldDefault::EmptyList,
        "Time-of-day windows the component is active; always active when empty",
    ),
    optional(
        "peak_identification_settings",
        "peakIdentificationSettings",
        FieldKind::Object("PeakIdentificationSettings"),
        "Required for peak components",
    ),
];

const PRICE_FIELDS: &[FieldSpec] = &[
    defaulted(
        "price_ex_vat",
        "priceExVat",
        FieldKind::Number,
        FieldDefault::Derived,
        "Amount excluding VAT in currency units (kronor, not öre); derived from priceIncVat when absent",
    ),
    defaulted(
        "price_inc_vat",
        "priceIncVat",
        FieldKind::Number,
        FieldDefault::Derived,
        "Amount including VAT in currency units; derived from priceExVat when absent",
    ),
    defaulted(
        "currency",
        "currency",
        FieldKind::Enum(Currency::WIRE_VALUES),
        FieldDefault::Text("SEK"),
        "Currency of both amounts",
    ),
    defaulted(
        "vat_rate",
        "vatRate",
        FieldKind::Number,
        FieldDefault::Derived,
        "VAT as a fraction, 0.25 for 25%; the configured default rate when absent",
    ),
];

const RECURRING_PERIOD_FIELDS: &[FieldSpec] = &[
    defaulted(
        "reference",
        "reference",
        FieldKind::String,
        FieldDefault::Text("main"),
        "Meter reference",
    ),
    defaulted(
        "frequency",
        "frequency",
        FieldKind::Duration,
        FieldDefault::Text("P1D"),
        "How often the windows recur",
    ),
    required(
        "active_periods",
        "activePeriods",
        FieldKind::ObjectArray("ActivePeriod"),
        "Windows within each recurrence",
    ),
];

const ACTIVE_PERIOD_FIELDS: &[FieldSpec] = &[
    required("from_including", "fromIncluding", FieldKind::Time, "Start of the window"),
    required(
        "to_excluding",
        "toExcluding",
        FieldKind::Time,
        "End of the window; 00:00:00 means end of day",
    ),
    optional(
        "calendar_pattern_references",
        "calendarPatternReferences",
        FieldKind::Object("CalendarPatternReference"),
        "Day sets the window applies on, e.g. include weekdays, exclude holidays",
    ),
];

const CALENDAR_PATTERN_REFERENCE_FIELDS: &[FieldSpec] = &[
    defaulted(
        "include",
        "include",
        FieldKind::StringArray,
        FieldDefault::EmptyList,
        "Calendar pattern references the window applies on",
    ),
    defaulted(
        "exclude",
        "exclude",
        FieldKind::StringArray,
        FieldDefault::EmptyList,
        "Calendar pattern references the window never applies on",
    ),
];

const PEAK_SETTINGS_FIELDS: &[FieldSpec] = &[
    defaulted(
        "peak_function",
        "peakFunction",
        FieldKind::String,
        FieldDefault::Text("peak(main)"),
        "Function selecting peaks",
    ),
    defaulted(
        "peak_identification_period",
        "peakIdentificationPeriod",
        FieldKind::Duration,
        FieldDefault::Text("P1D"),
        "Period each peak is identified within",
    ),
    defaulted(
        "peak_duration",
        "peakDuration",
        FieldKind::Duration,
        FieldDefault::Text("PT1H"),
        "Duration a peak is measured over",
    ),
    defaulted(
        "number_of_peaks_for_average_calculation",
        "numberOfPeaksForAverageCalculation",
        FieldKind::Integer,
        FieldDefault::Integer(1),
        "Number of peaks averaged for billing, e.g. 3 for the mean of the three highest",
    ),
];

const CALENDAR_PATTERN_FIELDS: &[FieldSpec] = &[
    required("reference", "reference", FieldKind::String, "Reference used by active periods"),
    required("frequency", "frequency", FieldKind::Duration, "Recurrence of the pattern"),
    optional("days", "days", FieldKind::IntegerArray, "ISO weekdays, 1 = Monday"),
    optional("dates", "dates", FieldKind::DateArray, "Specific dates"),
];

const OBJECTS_V0_1: &[ObjectSpec] = &[
    ObjectSpec {
        name: "TariffDocument",
        description: "Tariff document of one grid operator",
        fields: TARIFF_DOCUMENT_FIELDS,
        extensible: true,
    },
    ObjectSpec {
        name: "Tariff",
        description: "One tariff (product) of a grid operator",
        fields: TARIFF_FIELDS,
        extensible: true,
    },
    ObjectSpec {
        name: "ValidPeriod",
        description: "Date window, inclusive start and exclusive end",
        fields: VALID_PERIOD_FIELDS,
        extensible: false,
    },
    ObjectSpec {
        name: "PriceElement",
        description: "Group of price components of one kind",
        fields: PRICE_ELEMENT_FIELDS,
        extensible: true,
    },
    ObjectSpec {
        name: "PriceComponent",
        description: "One priced fee",
        fields: PRICE_COMPONENT_FIELDS,
        extensible: true,
    },
    ObjectSpec {
        name: "Price",
        description: "Monetary amount with VAT breakdown",
        fields: PRICE_FIELDS,
        extensible: false,
    },
    ObjectSpec {
        name: "RecurringPeriod",
        description: "Recurring schedule of active windows",
        fields: RECURRING_PERIOD_FIELDS,
        extensible: false,
    },
    ObjectSpec {
        name: "ActivePeriod",
        description: "Window within a day",
        fields: ACTIVE_PERIOD_FIELDS,
        extensible: false,
    },
    ObjectSpec {
        name: "CalendarPatternReference",
        description: "Calendar patterns to include or exclude",
        fields: CALENDAR_PATTERN_REFERENCE_FIELDS,
        extensible: false,
    },
    ObjectSpec {
        name: "PeakIdentificationSettings",
        description: "How peaks are identified for peak pricing",
        fields: PEAK_SETTINGS_FIELDS,
        extensible: false,
    },
    ObjectSpec {
        name: "CalendarPattern",
        description: "Named set of days",
        fields: CALENDAR_PATTERN_FIELDS,
        extensible: false,
    },
];

static DESCRIPTOR_V0_1: SchemaDescriptor = SchemaDescriptor {
    version: CURRENT_SCHEMA_VERSION,
    root: "TariffDocument",
    objects: OBJECTS_V0_1,
    model_schema: OnceLock::new(),
};

impl SchemaDescriptor {
    /// Descriptor of the current schema version
    pub fn current() -> &'static SchemaDescriptor {
        &DESCRIPTOR_V0_1
    }

    /// Descriptor of a specific version, if supported
    pub fn for_version(version: &str) -> Option<&'static SchemaDescriptor> {
        match version {
            CURRENT_SCHEMA_VERSION => Some(&DESCRIPTOR_V0_1),
            _ => None,
        }
    }

    /// All supported versions
    pub fn supported_versions() -> Vec<&'static str> {
        vec![DESCRIPTOR_V0_1.version]
    }

    /// Version this descriptor describes
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// The document (root) object
    pub fn root(&self) -> &ObjectSpec {
        // The root name is one of `objects` by construction
        self.object(self.root).unwrap_or(&self.objects[0])
    }

    /// All objects, root first
    pub fn objects(&self) -> &'static [ObjectSpec] {
        self.objects
    }

    /// Look up an object by name
    pub fn object(&self, name: &str) -> Option<&ObjectSpec> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// JSON Schema the model's output must conform to
    ///
    /// Built on first use; later calls return the same value.
    pub fn model_output_schema(&self) -> &Value {
        self.model_schema.get_or_init(|| {
            let defs = self.component_schemas(SchemaMode::ModelOutput, "#/$defs/");
            let mut root = defs
                .get(self.root)
                .cloned()
                .unwrap_or_else(|| json!({"type": "object"}));
            let nested: Map<String, Value> = defs
                .into_iter()
                .filter(|(name, _)| name != self.root)
                .collect();
            if let Value::Object(map) = &mut root {
                map.insert("$defs".to_string(), Value::Object(nested));
            }
            root
        })
    }

    /// One JSON Schema per object, `$ref`s resolved against `ref_prefix`
    pub fn component_schemas(&self, mode: SchemaMode, ref_prefix: &str) -> Map<String, Value> {
        self.objects
            .iter()
            .map(|object| (object.name.to_string(), object_schema(object, mode, ref_prefix)))
            .collect()
    }

    /// Plain-text description of every object and field, for prompts
    pub fn describe(&self) -> String {
        let mut out = format!("Tariff document schema, version {}\n", self.version);
        for object in self.objects {
            out.push_str(&format!("\n{}: {}\n", object.name, object.description));
            for field in object.fields {
                let presence = match (field.required, field.default) {
                    (_, Some(FieldDefault::Text(value))) => format!("optional, default \"{}\"", value),
                    (_, Some(FieldDefault::Integer(value))) => format!("optional, default {}", value),
                    (_, Some(FieldDefault::EmptyList)) => "optional, default empty".to_string(),
                    (_, Some(FieldDefault::Derived)) => "optional, derived when absent".to_string(),
                    (true, None) => "required".to_string(),
                    (false, None) => "optional".to_string(),
                };
                out.push_str(&format!(
                    "  - {} ({}, {}): {}\n",
                    field.wire,
                    field.kind.label(),
                    presence,
                    field.description
                ));
            }
        }
        out
    }
}

fn kind_schema(kind: &FieldKind, ref_prefix: &str) -> Value {
    match kind {
        FieldKind::String => json!({"type": "string"}),
        FieldKind::Number => json!({"type": "number"}),
        FieldKind::Integer => json!({"type": "integer", "minimum": 0}),
        FieldKind::Date => json!({"type": "string", "format": "date"}),
        FieldKind::Time => json!({"type": "string", "pattern": "^[0-2][0-9]:[0-5][0-9]:[0-5][0-9]$"}),
        FieldKind::DateTime => json!({"type": "string", "format": "date-time"}),
        FieldKind::Duration => json!({"type": "string", "format": "duration"}),
        FieldKind::Enum(values) => json!({"type": "string", "enum": values}),
        FieldKind::Object(name) => json!({"$ref": format!("{}{}", ref_prefix, name)}),
        FieldKind::ObjectArray(name) => {
            json!({"type": "array", "items": {"$ref": format!("{}{}", ref_prefix, name)}})
        }
        FieldKind::StringArray => json!({"type": "array", "items": {"type": "string"}}),
        FieldKind::IntegerArray => json!({"type": "array", "items": {"type": "integer"}}),
        FieldKind::DateArray => json!({"type": "array", "items": {"type": "string", "format": "date"}}),
    }
}

fn object_schema(object: &ObjectSpec, mode: SchemaMode, ref_prefix: &str) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in object.fields {
        let mut schema = kind_schema(&field.kind, ref_prefix);
        if let Value::Object(map) = &mut schema {
            if !map.contains_key("$ref") {
                map.insert("description".to_string(), json!(field.description));
            }
        }
        properties.insert(field.wire.to_string(), schema);

        let is_required = match mode {
            SchemaMode::ModelOutput => field.model_must_supply(),
            SchemaMode::Published => field.required,
        };
        if is_required {
            required.push(json!(field.wire));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("description".to_string(), json!(object.description));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    schema.insert("additionalProperties".to_string(), json!(object.extensible));
    Value::Object(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camel_case(name: &str) -> String {
        let mut out = String::new();
        let mut upper = false;
        for c in name.chars() {
            if c == '_' {
                upper = true;
            } else if upper {
                out.extend(c.to_uppercase());
                upper = false;
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_current_version_is_known() {
        assert!(SchemaDescriptor::for_version(CURRENT_SCHEMA_VERSION).is_some());
        assert!(SchemaDescriptor::for_version("9.9.9").is_none());
        assert_eq!(SchemaDescriptor::current().version(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        for object in SchemaDescriptor::current().objects() {
            for field in object.fields {
                if field.name == "component_type" {
                    assert_eq!(field.wire, "type");
                } else {
                    assert_eq!(field.wire, camel_case(field.name), "{}.{}", object.name, field.name);
                }
            }
        }
    }

    #[test]
    fn test_nested_objects_resolve() {
        let descriptor = SchemaDescriptor::current();
        for object in descriptor.objects() {
            for field in object.fields {
                if let FieldKind::Object(name) | FieldKind::ObjectArray(name) = field.kind {
                    assert!(descriptor.object(name).is_some(), "missing object {}", name);
                }
            }
        }
    }

    #[test]
    fn test_model_schema_is_built_once() {
        let descriptor = SchemaDescriptor::current();
        let first = descriptor.model_output_schema() as *const Value;
        let second = descriptor.model_output_schema() as *const Value;
        assert_eq!(first, second);
    }

    #[test]
    fn test_model_schema_requires_only_undefaulted_fields() {
        let schema = SchemaDescriptor::current().model_output_schema();
        assert_eq!(schema["required"], json!(["tariffs"]));

        let tariff = &schema["$defs"]["Tariff"];
        let required: Vec<&str> = tariff["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"companyOrgNo"));
        assert!(!required.contains(&"id"));
        assert_eq!(schema["$defs"]["Price"]["additionalProperties"], json!(false));
    }

    #[test]
    fn test_describe_mentions_every_field() {
        let descriptor = SchemaDescriptor::current();
        let text = descriptor.describe();
        for object in descriptor.objects() {
            for field in object.fields {
                assert!(text.contains(field.wire));
            }
        }
    }
}
