//! Normalization of raw documents into canonical wire form
//!
//! Runs before structural validation and only rewrites values into the
//! canonical form the schema defines. Every rewrite is recorded as a note.
//! Nothing is removed except explicit `null`s.
//!
//! Three passes:
//! 1. Scalar coercion driven by the descriptor (numbers, enums, times, dates)
//! 2. Tariff rules (organisation numbers, units and currencies, VAT, ids)
//! 3. Defaults from the descriptor, then default calendar patterns

use crate::paths::{index, join};
use crate::ValidationConfig;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use eltariff_domain::calendar;
use eltariff_domain::schema::{FieldDefault, FieldKind, ObjectSpec, SchemaDescriptor};
use eltariff_domain::tariff::{round_price, stable_id, ElementKind};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Rewrites one document in place
pub struct Normalizer<'a> {
    descriptor: &'a SchemaDescriptor,
    config: &'a ValidationConfig,
    notes: Vec<String>,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer for one descriptor
    pub fn new(descriptor: &'a SchemaDescriptor, config: &'a ValidationConfig) -> Self {
        Self {
            descriptor,
            config,
            notes: Vec::new(),
        }
    }

    /// Normalize a document and return the notes
    pub fn normalize(mut self, document: &mut Value) -> Vec<String> {
        let descriptor = self.descriptor;
        if let Value::Object(root) = document {
            self.coerce_object(descriptor.root(), root, "");
            self.normalize_tariffs(root);
            self.fill_defaults(descriptor.root(), root, "");
            self.add_calendar_patterns(root);
        }
        self.notes
    }

    fn note(&mut self, path: &str, message: impl AsRef<str>) {
        let path = if path.is_empty() { "$" } else { path };
        self.notes.push(format!("{}: {}", path, message.as_ref()));
    }

    // Pass 1

    fn coerce_object(&mut self, spec: &ObjectSpec, map: &mut Map<String, Value>, path: &str) {
        map.retain(|_, v| !v.is_null());
        let descriptor = self.descriptor;

        for field in spec.fields {
            let Some(value) = map.get_mut(field.wire) else {
                continue;
            };
            let child = join(path, field.wire);

            match field.kind {
                FieldKind::Number => self.coerce_number(value, &child),
                FieldKind::Integer => self.coerce_integer(value, &child),
                FieldKind::Time => self.coerce_time(value, &child),
                FieldKind::Date => self.coerce_date(value, &child),
                FieldKind::DateTime => self.coerce_datetime(value, &child),
                FieldKind::Duration => self.coerce_duration(value, &child),
                FieldKind::Enum(values) => self.coerce_enum(field.wire, values, value, &child),
                FieldKind::String => {
                    if let Value::Number(n) = value {
                        let text = n.to_string();
                        self.note(&child, format!("converted number {} to text", text));
                        *value = Value::String(text);
                    }
                }
                FieldKind::Object(name) => {
                    if let (Some(nested), Value::Object(m)) = (descriptor.object(name), value) {
                        self.coerce_object(nested, m, &child);
                    }
                }
                FieldKind::ObjectArray(name) => {
                    if value.is_object() {
                        self.note(&child, "wrapped single object in a list");
                        let single = value.take();
                        *value = Value::Array(vec![single]);
                    }
                    if let (Some(nested), Value::Array(items)) = (descriptor.object(name), value) {
                        for (i, item) in items.iter_mut().enumerate() {
                            if let Value::Object(m) = item {
                                self.coerce_object(nested, m, &index(&child, i));
                            }
                        }
                    }
                }
                FieldKind::StringArray => {
                    if value.is_string() {
                        self.note(&child, "wrapped single value in a list");
                        let single = value.take();
                        *value = Value::Array(vec![single]);
                    }
                }
                FieldKind::IntegerArray => {
                    if let Value::Array(items) = value {
                        for (i, item) in items.iter_mut().enumerate() {
                            self.coerce_integer(item, &index(&child, i));
                        }
                    }
                }
                FieldKind::DateArray => {
                    if let Value::Array(items) = value {
                        for (i, item) in items.iter_mut().enumerate() {
                            self.coerce_date(item, &index(&child, i));
                        }
                    }
                }
            }
        }
    }

    fn coerce_number(&mut self, value: &mut Value, path: &str) {
        let Value::String(text) = value else {
            return;
        };
        if let Some(number) = parse_number(text).and_then(Number::from_f64) {
            self.note(path, format!("coerced \"{}\" to {}", text, number));
            *value = Value::Number(number);
        }
    }

    fn coerce_integer(&mut self, value: &mut Value, path: &str) {
        let parsed = match value {
            Value::String(text) => text.trim().parse::<u64>().ok(),
            Value::Number(n) if n.as_u64().is_none() => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64),
            _ => None,
        };
        if let Some(n) = parsed {
            self.note(path, format!("coerced {} to integer {}", value, n));
            *value = Value::Number(n.into());
        }
    }

    fn coerce_time(&mut self, value: &mut Value, path: &str) {
        let Value::String(text) = value else {
            return;
        };
        if let Some(time) = normalize_time(text) {
            if time != *text {
                self.note(path, format!("normalized time \"{}\" to \"{}\"", text, time));
                *value = Value::String(time);
            }
        }
    }

    fn coerce_date(&mut self, value: &mut Value, path: &str) {
        let Value::String(text) = value else {
            return;
        };
        let trimmed = text.trim();
        if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok() {
            if trimmed != text.as_str() {
                *value = Value::String(trimmed.to_string());
            }
            return;
        }
        let head: String = trimmed.chars().take(10).collect();
        let rest = &trimmed[head.len()..];
        if NaiveDate::parse_from_str(&head, "%Y-%m-%d").is_ok()
            && (rest.starts_with('T') || rest.starts_with(' '))
        {
            self.note(path, format!("truncated \"{}\" to date", text));
            *value = Value::String(head);
        }
    }

    fn coerce_datetime(&mut self, value: &mut Value, path: &str) {
        let Value::String(text) = value else {
            return;
        };
        let trimmed = text.trim();
        if DateTime::parse_from_rfc3339(trimmed).is_ok() {
            return;
        }
        let fixed = if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok() {
            Some(format!("{}T00:00:00Z", trimmed))
        } else if NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").is_ok()
            || NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").is_ok()
        {
            Some(format!("{}Z", trimmed.replacen(' ', "T", 1)))
        } else {
            None
        };
        if let Some(fixed) = fixed {
            self.note(path, format!("read \"{}\" as UTC timestamp", text));
            *value = Value::String(fixed);
        }
    }

    fn coerce_duration(&mut self, value: &mut Value, path: &str) {
        let Value::String(text) = value else {
            return;
        };
        let canonical = text.trim().to_uppercase();
        if canonical != *text {
            self.note(path, format!("normalized duration \"{}\" to \"{}\"", text, canonical));
            *value = Value::String(canonical);
        }
    }

    fn coerce_enum(&mut self, wire: &str, values: &[&str], value: &mut Value, path: &str) {
        let Value::String(text) = value else {
            return;
        };
        if values.iter().any(|v| *v == text.as_str()) {
            return;
        }
        let lower = text.trim().to_lowercase();
        let resolved = values
            .iter()
            .find(|v| v.to_lowercase() == lower)
            .copied()
            .or_else(|| enum_alias(wire, &lower));
        if let Some(resolved) = resolved {
            self.note(path, format!("coerced \"{}\" to \"{}\"", text, resolved));
            *value = Value::String(resolved.to_string());
        }
    }

    // Pass 2

    fn normalize_tariffs(&mut self, root: &mut Map<String, Value>) {
        let Some(Value::Array(tariffs)) = root.get_mut("tariffs") else {
            return;
        };

        for (i, tariff) in tariffs.iter_mut().enumerate() {
            let Value::Object(tariff) = tariff else {
                continue;
            };
            let path = index("tariffs", i);
            self.normalize_org_no(tariff, &path);

            let parts = [text_field(tariff, "companyOrgNo"), text_field(tariff, "name")];
            let tariff_id = match parts {
                [Some(org_no), Some(name)] => {
                    self.ensure_id(tariff, &path, &[org_no.as_str(), name.as_str()])
                }
                _ => text_field(tariff, "id"),
            };

            for kind in ElementKind::ALL {
                let key = kind.wire_key();
                let Some(Value::Object(element)) = tariff.get_mut(key) else {
                    continue;
                };
                let element_path = join(&path, key);
                let element_id = match &tariff_id {
                    Some(id) => self.ensure_id(element, &element_path, &[id.as_str(), key]),
                    None => text_field(element, "id"),
                };

                let Some(Value::Array(components)) = element.get_mut("components") else {
                    continue;
                };
                // seasonal variants share a name, so the window is part of the id
                let mut occurrences: BTreeMap<(String, String), usize> = BTreeMap::new();
                for (j, component) in components.iter_mut().enumerate() {
                    let Value::Object(component) = component else {
                        continue;
                    };
                    let component_path = index(&join(&element_path, "components"), j);
                    self.normalize_component(component, &component_path);

                    if let (Some(element_id), Some(name)) =
                        (&element_id, text_field(component, "name"))
                    {
                        let window = component
                            .get("validPeriod")
                            .map(Value::to_string)
                            .unwrap_or_default();
                        let seen = occurrences.entry((name.clone(), window.clone())).or_insert(0);
                        let occurrence = seen.to_string();
                        *seen += 1;
                        self.ensure_id(
                            component,
                            &component_path,
                            &[element_id.as_str(), name.as_str(), window.as_str(), occurrence.as_str()],
                        );
                    }
                }
            }
        }
    }

    fn ensure_id(&mut self, map: &mut Map<String, Value>, path: &str, parts: &[&str]) -> Option<String> {
        let derivable = match map.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => return Some(id.clone()),
            Some(Value::String(_)) | None => true,
            Some(_) => false,
        };
        if !derivable {
            return None;
        }
        let id = stable_id(parts);
        self.note(path, format!("derived id {}", id));
        map.insert("id".to_string(), Value::String(id.clone()));
        Some(id)
    }

    fn normalize_org_no(&mut self, tariff: &mut Map<String, Value>, path: &str) {
        let Some(Value::String(org_no)) = tariff.get("companyOrgNo") else {
            return;
        };
        let mut digits: String = org_no.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() == 12 && digits.starts_with("16") {
            digits.drain(..2);
        }
        if digits.len() != 10 {
            return;
        }
        let canonical = format!("{}-{}", &digits[..6], &digits[6..]);
        if canonical != *org_no {
            self.note(
                &join(path, "companyOrgNo"),
                format!("canonicalized \"{}\" to \"{}\"", org_no, canonical),
            );
            tariff.insert("companyOrgNo".to_string(), Value::String(canonical));
        }
    }

    fn normalize_component(&mut self, component: &mut Map<String, Value>, path: &str) {
        self.sort_active_periods(component, path);

        let mut scale = 1.0;
        let mut currency: Option<&'static str> = None;

        if let Some(Value::String(unit)) = component.get("unit").cloned() {
            if let Some(parts) = parse_unit(&unit) {
                let rewritten = parts.unit.map(|(u, _)| u);
                if rewritten != Some(unit.as_str()) {
                    match rewritten {
                        Some(u) => {
                            self.note(&join(path, "unit"), format!("read \"{}\" as {}", unit, u));
                            component.insert("unit".to_string(), Value::String(u.to_string()));
                        }
                        None => {
                            self.note(&join(path, "unit"), format!("read \"{}\" as a fixed fee", unit));
                            component.remove("unit");
                        }
                    }
                }
                if let Some((_, factor)) = parts.unit {
                    scale *= factor;
                }
                if let Some((code, factor)) = parts.currency {
                    currency = Some(code);
                    scale *= factor;
                }
                if let Some(period) = parts.period {
                    if !component.contains_key("pricedPeriod") {
                        self.note(&join(path, "pricedPeriod"), format!("set to {} from unit \"{}\"", period, unit));
                        component.insert("pricedPeriod".to_string(), Value::String(period.to_string()));
                    }
                }
            }
        }

        let price_path = join(path, "price");
        let Some(Value::Object(price)) = component.get_mut("price") else {
            return;
        };

        if let Some(Value::String(declared)) = price.get("currency").cloned() {
            if !matches!(declared.as_str(), "SEK" | "EUR") {
                if let Some((code, factor)) = currency_alias(&declared.trim().to_lowercase()) {
                    // the unit already scaled minor currency units
                    if currency.is_none() {
                        scale *= factor;
                    }
                    currency = Some(code);
                }
            }
        }
        if let Some(code) = currency {
            if price.get("currency").and_then(Value::as_str) != Some(code) {
                self.note(&join(&price_path, "currency"), format!("set to {}", code));
                price.insert("currency".to_string(), Value::String(code.to_string()));
            }
        }

        if scale != 1.0 {
            for key in ["priceExVat", "priceIncVat"] {
                if let Some(amount) = price.get(key).and_then(Value::as_f64) {
                    let scaled = round_price(amount * scale);
                    if let Some(number) = Number::from_f64(scaled) {
                        self.note(&join(&price_path, key), format!("scaled {} to {}", amount, scaled));
                        price.insert(key.to_string(), Value::Number(number));
                    }
                }
            }
        }

        self.normalize_vat(price, &price_path);
    }

    fn normalize_vat(&mut self, price: &mut Map<String, Value>, path: &str) {
        let declared = price.get("vatRate").map(Value::as_f64);
        let rate = match declared {
            None => {
                let rate = self.config.default_vat_rate;
                self.note(&join(path, "vatRate"), format!("applied default VAT rate {}", rate));
                set_number(price, "vatRate", rate);
                rate
            }
            Some(Some(rate)) if rate > 1.0 && rate <= 100.0 => {
                let fraction = rate / 100.0;
                self.note(&join(path, "vatRate"), format!("read {} as {}%", rate, rate));
                set_number(price, "vatRate", fraction);
                fraction
            }
            Some(Some(rate)) => rate,
            Some(None) => return,
        };

        let ex = price.get("priceExVat").and_then(Value::as_f64);
        let inc = price.get("priceIncVat").and_then(Value::as_f64);
        match (ex, inc) {
            (Some(ex), None) if !price.contains_key("priceIncVat") => {
                let inc = round_price(ex * (1.0 + rate));
                self.note(&join(path, "priceIncVat"), format!("derived {} from priceExVat", inc));
                set_number(price, "priceIncVat", inc);
            }
            (None, Some(inc)) if !price.contains_key("priceExVat") => {
                let ex = round_price(inc / (1.0 + rate));
                self.note(&join(path, "priceExVat"), format!("derived {} from priceIncVat", ex));
                set_number(price, "priceExVat", ex);
            }
            _ => {}
        }
    }

    fn sort_active_periods(&mut self, component: &mut Map<String, Value>, path: &str) {
        let Some(Value::Array(recurring)) = component.get_mut("recurringPeriods") else {
            return;
        };
        let mut sorted_paths = Vec::new();
        for (i, period) in recurring.iter_mut().enumerate() {
            let Some(Value::Array(active)) = period.get_mut("activePeriods") else {
                continue;
            };
            let start = |v: &Value| {
                v.get("fromIncluding")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let already_sorted = active.windows(2).all(|w| start(&w[0]) <= start(&w[1]));
            if !already_sorted {
                active.sort_by_key(start);
                sorted_paths.push(join(&index(&join(path, "recurringPeriods"), i), "activePeriods"));
            }
        }
        for sorted in sorted_paths {
            self.note(&sorted, "sorted active periods by start");
        }
    }

    // Pass 3

    fn fill_defaults(&mut self, spec: &ObjectSpec, map: &mut Map<String, Value>, path: &str) {
        let descriptor = self.descriptor;
        for field in spec.fields {
            let child = join(path, field.wire);
            match (map.get_mut(field.wire), field.default) {
                (None, Some(FieldDefault::Text(text))) => {
                    self.note(&child, format!("defaulted to \"{}\"", text));
                    map.insert(field.wire.to_string(), Value::String(text.to_string()));
                }
                (None, Some(FieldDefault::Integer(n))) => {
                    self.note(&child, format!("defaulted to {}", n));
                    map.insert(field.wire.to_string(), Value::Number(n.into()));
                }
                (None, Some(FieldDefault::EmptyList)) => {
                    map.insert(field.wire.to_string(), Value::Array(Vec::new()));
                }
                (Some(Value::Object(nested)), _) => {
                    if let FieldKind::Object(name) = field.kind {
                        if let Some(nested_spec) = descriptor.object(name) {
                            self.fill_defaults(nested_spec, nested, &child);
                        }
                    }
                }
                (Some(Value::Array(items)), _) => {
                    if let FieldKind::ObjectArray(name) = field.kind {
                        if let Some(nested_spec) = descriptor.object(name) {
                            for (i, item) in items.iter_mut().enumerate() {
                                if let Value::Object(m) = item {
                                    self.fill_defaults(nested_spec, m, &index(&child, i));
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn add_calendar_patterns(&mut self, root: &mut Map<String, Value>) {
        let year = earliest_validity_year(root);
        let referenced = referenced_patterns(root);
        let defaults = year.map(calendar::default_patterns).unwrap_or_default();

        match root.get_mut("calendarPatterns") {
            None => {
                let patterns: Vec<Value> = defaults
                    .iter()
                    .filter_map(|p| serde_json::to_value(p).ok())
                    .collect();
                if let Some(year) = year {
                    self.note(
                        "calendarPatterns",
                        format!("added default Swedish calendar patterns for {}", year),
                    );
                }
                root.insert("calendarPatterns".to_string(), Value::Array(patterns));
            }
            Some(Value::Array(existing)) => {
                let defined: BTreeSet<String> = existing
                    .iter()
                    .filter_map(|p| p.get("reference").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                let mut added = Vec::new();
                for pattern in &defaults {
                    if referenced.contains(&pattern.reference) && !defined.contains(&pattern.reference) {
                        if let Ok(value) = serde_json::to_value(pattern) {
                            existing.push(value);
                            added.push(pattern.reference.clone());
                        }
                    }
                }
                for reference in added {
                    self.note(
                        "calendarPatterns",
                        format!("added default pattern \"{}\"", reference),
                    );
                }
            }
            Some(_) => {}
        }
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn set_number(map: &mut Map<String, Value>, key: &str, value: f64) {
    if let Some(number) = Number::from_f64(value) {
        map.insert(key.to_string(), Value::Number(number));
    }
}

fn earliest_validity_year(root: &Map<String, Value>) -> Option<i32> {
    root.get("tariffs")?
        .as_array()?
        .iter()
        .filter_map(|t| t.get("validPeriod")?.get("fromIncluding")?.as_str())
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.year())
        .min()
}

fn referenced_patterns(root: &Map<String, Value>) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    let tariffs = root.get("tariffs").and_then(Value::as_array);
    for tariff in tariffs.into_iter().flatten() {
        for kind in ElementKind::ALL {
            let components = tariff
                .get(kind.wire_key())
                .and_then(|e| e.get("components"))
                .and_then(Value::as_array);
            for component in components.into_iter().flatten() {
                let recurring = component.get("recurringPeriods").and_then(Value::as_array);
                for period in recurring.into_iter().flatten() {
                    let active = period.get("activePeriods").and_then(Value::as_array);
                    for window in active.into_iter().flatten() {
                        let Some(selection) = window.get("calendarPatternReferences") else {
                            continue;
                        };
                        for key in ["include", "exclude"] {
                            let names = selection.get(key).and_then(Value::as_array);
                            for name in names.into_iter().flatten().filter_map(Value::as_str) {
                                refs.insert(name.to_string());
                            }
                        }
                    }
                }
            }
        }
    }
    refs
}

/// Parse a number written as text, accepting a decimal comma
///
/// A trailing `%` divides by 100.
pub fn parse_number(text: &str) -> Option<f64> {
    let mut cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let percent = cleaned.ends_with('%');
    if percent {
        cleaned.pop();
    }
    if let Some(stripped) = cleaned.strip_suffix(":-") {
        cleaned = stripped.to_string();
    }
    if cleaned.contains(',') {
        cleaned = if cleaned.contains('.') {
            cleaned.replace('.', "").replace(',', ".")
        } else {
            cleaned.replace(',', ".")
        };
    }
    let number: f64 = cleaned.parse().ok()?;
    if !number.is_finite() {
        return None;
    }
    Some(if percent { number / 100.0 } else { number })
}

/// Canonical `HH:MM:SS` for a time of day; `24:00` is end of day
pub fn normalize_time(text: &str) -> Option<String> {
    let text = text.trim().replace('.', ":");
    let parts: Vec<&str> = text.split(':').collect();
    let numbers: Option<Vec<u32>> = parts.iter().map(|p| p.parse::<u32>().ok()).collect();
    let (h, m, s) = match numbers?.as_slice() {
        [h] => (*h, 0, 0),
        [h, m] => (*h, *m, 0),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };
    if h == 24 && m == 0 && s == 0 {
        return Some("00:00:00".to_string());
    }
    if h > 23 || m > 59 || s > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}:{:02}", h, m, s))
}

fn enum_alias(wire: &str, lower: &str) -> Option<&'static str> {
    match (wire, lower) {
        ("type", "fast" | "fast avgift" | "fixed fee") => Some("fixed"),
        ("type", "rörlig" | "rorlig" | "variabel") => Some("variable"),
        ("type", "effekt" | "power" | "toppeffekt" | "effektavgift") => Some("peak"),
        ("type", "dynamisk") => Some("dynamic"),
        ("direction", "förbrukning" | "forbrukning" | "uttag" | "import" | "consume") => {
            Some("consumption")
        }
        ("direction", "produktion" | "inmatning" | "export" | "produce") => Some("production"),
        _ => None,
    }
}

/// Currency and the factor converting a price to its major unit
fn currency_alias(lower: &str) -> Option<(&'static str, f64)> {
    match lower {
        "sek" | "kr" | "kr." | "kronor" | "krona" | ":-" => Some(("SEK", 1.0)),
        "öre" | "ore" => Some(("SEK", 0.01)),
        "eur" | "€" | "euro" | "euros" => Some(("EUR", 1.0)),
        "cent" | "cents" | "ct" | "c" => Some(("EUR", 0.01)),
        _ => None,
    }
}

/// Unit and the factor converting a price per source unit to a price per wire unit
fn unit_alias(lower: &str) -> Option<(&'static str, f64)> {
    match lower {
        "kwh" => Some(("kWh", 1.0)),
        "wh" => Some(("kWh", 1000.0)),
        "mwh" => Some(("kWh", 0.001)),
        "kw" => Some(("kW", 1.0)),
        "w" => Some(("kW", 1000.0)),
        "mw" => Some(("kW", 0.001)),
        "kvar" => Some(("kVAr", 1.0)),
        _ => None,
    }
}

fn period_alias(lower: &str) -> Option<&'static str> {
    match lower {
        "månad" | "mån" | "manad" | "man" | "month" | "mo" => Some("P1M"),
        "år" | "ar" | "year" | "yr" => Some("P1Y"),
        "kvartal" | "quarter" => Some("P3M"),
        "dag" | "day" => Some("P1D"),
        _ => None,
    }
}

#[derive(Debug, Default, PartialEq)]
struct UnitParts {
    currency: Option<(&'static str, f64)>,
    unit: Option<(&'static str, f64)>,
    period: Option<&'static str>,
}

/// Split a combined unit such as `öre/kWh` or `kr/år`
///
/// Returns `None` unless every part is recognized.
fn parse_unit(text: &str) -> Option<UnitParts> {
    let lower = text.trim().to_lowercase().replace(" per ", "/");
    let mut parts = UnitParts::default();
    for token in lower.split('/').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(unit) = unit_alias(token) {
            parts.unit = Some(unit);
        } else if let Some(currency) = currency_alias(token) {
            parts.currency = Some(currency);
        } else if let Some(period) = period_alias(token) {
            parts.period = Some(period);
        } else {
            return None;
        }
    }
    if parts == UnitParts::default() {
        return None;
    }
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(mut document: Value) -> (Value, Vec<String>) {
        let config = ValidationConfig::default();
        let notes = Normalizer::new(SchemaDescriptor::current(), &config).normalize(&mut document);
        (document, notes)
    }

    fn component(doc: &Value) -> &Value {
        &doc["tariffs"][0]["energyPrice"]["components"][0]
    }

    fn document(component: Value) -> Value {
        json!({
            "tariffs": [{
                "name": "Enkeltariff",
                "companyName": "Exempel Nät AB",
                "companyOrgNo": "5560000000",
                "validPeriod": {"fromIncluding": "2025-01-01"},
                "energyPrice": {"name": "Överföringsavgift", "components": [component]}
            }]
        })
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("0,25"), Some(0.25));
        assert_eq!(parse_number("1 234,50"), Some(1234.5));
        assert_eq!(parse_number("1.234,50"), Some(1234.5));
        assert_eq!(parse_number("25%"), Some(0.25));
        assert_eq!(parse_number("350:-"), Some(350.0));
        assert_eq!(parse_number("gratis"), None);
    }

    #[test]
    fn test_normalize_time_variants() {
        assert_eq!(normalize_time("7:00").as_deref(), Some("07:00:00"));
        assert_eq!(normalize_time("22.00").as_deref(), Some("22:00:00"));
        assert_eq!(normalize_time("24:00").as_deref(), Some("00:00:00"));
        assert_eq!(normalize_time("25:00"), None);
    }

    #[test]
    fn test_parse_unit_combined() {
        let parts = parse_unit("öre/kWh").unwrap();
        assert_eq!(parts.currency, Some(("SEK", 0.01)));
        assert_eq!(parts.unit, Some(("kWh", 1.0)));

        let parts = parse_unit("kr/år").unwrap();
        assert_eq!(parts.unit, None);
        assert_eq!(parts.period, Some("P1Y"));

        assert!(parse_unit("kr/lägenhet").is_none());
    }

    #[test]
    fn test_ore_price_is_scaled() {
        let (doc, notes) = normalize(document(json!({
            "name": "Energiavgift",
            "unit": "öre/kWh",
            "price": {"priceExVat": "24,5"}
        })));
        let c = component(&doc);
        assert_eq!(c["unit"], "kWh");
        assert_eq!(c["price"]["currency"], "SEK");
        assert_eq!(c["price"]["priceExVat"], 0.245);
        assert_eq!(c["price"]["vatRate"], 0.25);
        assert_eq!(c["price"]["priceIncVat"], 0.30625);
        assert!(notes.iter().any(|n| n.contains("applied default VAT rate")));
    }

    #[test]
    fn test_mwh_price_is_rescaled() {
        let (doc, _) = normalize(document(json!({
            "name": "Energiavgift",
            "unit": "MWh",
            "price": {"priceExVat": 245.0, "currency": "SEK", "vatRate": 0.25}
        })));
        assert_eq!(component(&doc)["price"]["priceExVat"], 0.245);
    }

    #[test]
    fn test_ex_vat_derived_from_inc_vat() {
        let (doc, _) = normalize(document(json!({
            "name": "Energiavgift",
            "unit": "kWh",
            "price": {"priceIncVat": 125.0, "vatRate": 25}
        })));
        let price = &component(&doc)["price"];
        assert_eq!(price["vatRate"], 0.25);
        assert_eq!(price["priceExVat"], 100.0);
    }

    #[test]
    fn test_swedish_enum_aliases() {
        let mut doc = document(json!({
            "name": "Effektavgift",
            "type": "Effekt",
            "unit": "kwh",
            "price": {"priceExVat": 1.0}
        }));
        doc["tariffs"][0]["direction"] = json!("uttag");
        let (doc, _) = normalize(doc);
        assert_eq!(component(&doc)["type"], "peak");
        assert_eq!(component(&doc)["unit"], "kWh");
        assert_eq!(doc["tariffs"][0]["direction"], "consumption");
    }

    #[test]
    fn test_org_no_and_ids() {
        let (first, _) = normalize(document(json!({"name": "Energiavgift", "price": {"priceExVat": 1.0}})));
        let (second, _) = normalize(document(json!({"name": "Energiavgift", "price": {"priceExVat": 1.0}})));

        assert_eq!(first["tariffs"][0]["companyOrgNo"], "556000-0000");
        assert!(first["tariffs"][0]["id"].is_string());
        assert_eq!(first["tariffs"][0]["id"], second["tariffs"][0]["id"]);
        assert_eq!(component(&first)["id"], component(&second)["id"]);
    }

    #[test]
    fn test_component_id_follows_window_not_position() {
        let winter = json!({
            "name": "Energiavgift",
            "validPeriod": {"fromIncluding": "2025-01-01", "toExcluding": "2025-04-01"},
            "price": {"priceExVat": 0.3}
        });
        let summer = json!({
            "name": "Energiavgift",
            "validPeriod": {"fromIncluding": "2025-04-01", "toExcluding": "2025-11-01"},
            "price": {"priceExVat": 0.2}
        });
        let (winter_doc, _) = normalize(document(winter.clone()));
        let (summer_doc, _) = normalize(document(summer.clone()));
        assert_ne!(component(&winter_doc)["id"], component(&summer_doc)["id"]);

        let mut both = document(summer);
        both["tariffs"][0]["energyPrice"]["components"] = json!([winter.clone(), winter]);
        let (both, _) = normalize(both);
        let components = &both["tariffs"][0]["energyPrice"]["components"];
        assert_eq!(components[0]["id"], component(&winter_doc)["id"]);
        assert_ne!(components[0]["id"], components[1]["id"]);
    }

    #[test]
    fn test_defaults_and_calendar_patterns() {
        let (doc, _) = normalize(document(json!({"name": "Energiavgift", "price": {"priceExVat": 1.0}})));
        assert_eq!(doc["schemaVersion"], "0.1.0");
        assert_eq!(doc["tariffs"][0]["timeZone"], "Europe/Stockholm");
        assert_eq!(doc["tariffs"][0]["billingPeriod"], "P1M");
        assert_eq!(component(&doc)["reference"], "main");
        assert_eq!(component(&doc)["recurringPeriods"], json!([]));
        assert_eq!(doc["calendarPatterns"].as_array().unwrap().len(), 3);
        assert_eq!(doc["warnings"], json!([]));
    }

    #[test]
    fn test_missing_referenced_default_pattern_added() {
        let mut doc = document(json!({
            "name": "Energiavgift höglast",
            "unit": "kWh",
            "price": {"priceExVat": 1.0},
            "recurringPeriods": [{"activePeriods": [{
                "fromIncluding": "6:00",
                "toExcluding": "22:00",
                "calendarPatternReferences": {"include": ["weekdays"], "exclude": ["holidays"]}
            }]}]
        }));
        doc["calendarPatterns"] = json!([{"reference": "weekdays", "frequency": "P1W", "days": [1, 2, 3, 4, 5]}]);
        let (doc, _) = normalize(doc);

        let refs: Vec<&str> = doc["calendarPatterns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["reference"].as_str().unwrap())
            .collect();
        assert_eq!(refs, vec!["weekdays", "holidays"]);
        let window = &component(&doc)["recurringPeriods"][0]["activePeriods"][0];
        assert_eq!(window["fromIncluding"], "06:00:00");
    }

    #[test]
    fn test_active_periods_sorted() {
        let (doc, notes) = normalize(document(json!({
            "name": "Energiavgift",
            "unit": "kWh",
            "price": {"priceExVat": 1.0},
            "recurringPeriods": [{"activePeriods": [
                {"fromIncluding": "22:00:00", "toExcluding": "06:00:00"},
                {"fromIncluding": "06:00:00", "toExcluding": "22:00:00"}
            ]}]
        })));
        let windows = &component(&doc)["recurringPeriods"][0]["activePeriods"];
        assert_eq!(windows[0]["fromIncluding"], "06:00:00");
        assert!(notes.iter().any(|n| n.contains("sorted active periods")));
    }

    #[test]
    fn test_nulls_removed_and_unknown_kept() {
        let mut doc = document(json!({"name": "Energiavgift", "description": null, "price": {"priceExVat": 1.0}}));
        doc["tariffs"][0]["x-note"] = json!("kept");
        let (doc, _) = normalize(doc);
        assert!(component(&doc).get("description").is_none());
        assert_eq!(doc["tariffs"][0]["x-note"], "kept");
    }
}
