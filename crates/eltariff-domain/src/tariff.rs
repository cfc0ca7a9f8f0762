//! Tariff model - the canonical representation of a grid operator's offering
//!
//! Field names are snake_case internally and camelCase on the wire. The
//! mapping is fixed by the serde attributes below and mirrored, field by
//! field, in [`crate::schema`].

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Unrecognized wire fields, preserved verbatim
pub type Extensions = BTreeMap<String, Value>;

/// Seconds in a day, used as the exclusive end of a window ending at midnight
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Build a stable identifier from naming parts
///
/// Identical parts always give the identical id (UUIDv5), so re-extracting
/// the same tariff does not churn identifiers.
///
/// # Examples
///
/// ```
/// use eltariff_domain::tariff::stable_id;
///
/// let a = stable_id(&["556000-0000", "Enkeltariff"]);
/// let b = stable_id(&["556000-0000", "Enkeltariff"]);
/// assert_eq!(a, b);
/// assert_ne!(a, stable_id(&["556000-0000", "Effekttariff"]));
/// ```
pub fn stable_id(parts: &[&str]) -> String {
    let name = format!("urn:eltariff:{}", parts.join("/"));
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
}

/// One versioned tariff document covering one or more tariffs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffModel {
    /// Schema version this document was validated against
    pub schema_version: String,

    /// Tariffs offered by the operator
    pub tariffs: Vec<Tariff>,

    /// Calendar patterns referenced by active periods
    #[serde(default)]
    pub calendar_patterns: Vec<CalendarPattern>,

    /// Caveats reported during extraction
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Fields outside the standard
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl TariffModel {
    /// Parse a model from its wire JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty-printed wire JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize to a wire JSON value
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Find a tariff by id
    pub fn tariff(&self, id: &str) -> Option<&Tariff> {
        self.tariffs.iter().find(|t| t.id == id)
    }

    /// Ids of all tariffs, in document order
    pub fn tariff_ids(&self) -> Vec<&str> {
        self.tariffs.iter().map(|t| t.id.as_str()).collect()
    }

    /// Operator id (organisation number) of the first tariff
    pub fn operator_id(&self) -> Option<&str> {
        self.tariffs.first().map(|t| t.company_org_no.as_str())
    }

    /// Operator display name of the first tariff
    pub fn operator_name(&self) -> Option<&str> {
        self.tariffs.first().map(|t| t.company_name.as_str())
    }

    /// Look up a calendar pattern by reference
    pub fn calendar_pattern(&self, reference: &str) -> Option<&CalendarPattern> {
        self.calendar_patterns.iter().find(|p| p.reference == reference)
    }
}

/// Direction of energy flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Energy taken from the grid
    Consumption,
    /// Energy fed into the grid
    Production,
}

impl Direction {
    /// Wire values, in declaration order
    pub const WIRE_VALUES: &'static [&'static str] = &["consumption", "production"];

    /// Get the wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Consumption => "consumption",
            Direction::Production => "production",
        }
    }

    /// Parse a wire value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consumption" => Some(Direction::Consumption),
            "production" => Some(Direction::Production),
            _ => None,
        }
    }
}

/// Kind of price component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    /// Fixed rate
    Fixed,
    /// Rate varying with an external index
    Variable,
    /// Rate applied to identified peaks
    Peak,
    /// Rate published per interval
    Dynamic,
}

impl ComponentType {
    /// Wire values, in declaration order
    pub const WIRE_VALUES: &'static [&'static str] = &["fixed", "variable", "peak", "dynamic"];

    /// Get the wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Fixed => "fixed",
            ComponentType::Variable => "variable",
            ComponentType::Peak => "peak",
            ComponentType::Dynamic => "dynamic",
        }
    }

    /// Parse a wire value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(ComponentType::Fixed),
            "variable" => Some(ComponentType::Variable),
            "peak" => Some(ComponentType::Peak),
            "dynamic" => Some(ComponentType::Dynamic),
            _ => None,
        }
    }
}

/// Currency of a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Swedish krona
    SEK,
    /// Euro
    EUR,
}

impl Currency {
    /// Wire values, in declaration order
    pub const WIRE_VALUES: &'static [&'static str] = &["SEK", "EUR"];

    /// Get the wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::SEK => "SEK",
            Currency::EUR => "EUR",
        }
    }

    /// Parse a wire value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SEK" => Some(Currency::SEK),
            "EUR" => Some(Currency::EUR),
            _ => None,
        }
    }
}

/// Measurement unit a price applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Kilowatt-hour (energy)
    #[serde(rename = "kWh")]
    KWh,
    /// Kilowatt (active power)
    #[serde(rename = "kW")]
    KW,
    /// Kilovolt-ampere reactive (reactive power)
    #[serde(rename = "kVAr")]
    KVAr,
}

impl Unit {
    /// Wire values, in declaration order
    pub const WIRE_VALUES: &'static [&'static str] = &["kWh", "kW", "kVAr"];

    /// Get the wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::KWh => "kWh",
            Unit::KW => "kW",
            Unit::KVAr => "kVAr",
        }
    }

    /// Parse a wire value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kWh" => Some(Unit::KWh),
            "kW" => Some(Unit::KW),
            "kVAr" => Some(Unit::KVAr),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date window, inclusive start and exclusive (optional) end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidPeriod {
    /// First day the period applies
    pub from_including: NaiveDate,

    /// First day the period no longer applies; open-ended when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_excluding: Option<NaiveDate>,
}

impl ValidPeriod {
    /// Create a bounded period
    pub fn new(from_including: NaiveDate, to_excluding: Option<NaiveDate>) -> Self {
        Self {
            from_including,
            to_excluding,
        }
    }

    /// Whether the period has positive length
    pub fn is_well_ordered(&self) -> bool {
        self.to_excluding.map_or(true, |end| self.from_including < end)
    }

    /// Whether `other` lies entirely inside this period
    pub fn contains(&self, other: &ValidPeriod) -> bool {
        if other.from_including < self.from_including {
            return false;
        }
        match (self.to_excluding, other.to_excluding) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(end), Some(other_end)) => other_end <= end,
        }
    }

    /// Whether the two periods share at least one day
    pub fn overlaps(&self, other: &ValidPeriod) -> bool {
        let starts_before_other_ends = other
            .to_excluding
            .map_or(true, |end| self.from_including < end);
        let other_starts_before_end = self
            .to_excluding
            .map_or(true, |end| other.from_including < end);
        starts_before_other_ends && other_starts_before_end
    }
}

/// One tariff (product) of a grid operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tariff {
    /// Stable tariff id
    pub id: String,

    /// Tariff name as published
    pub name: String,

    /// Target group or other description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Period the tariff applies
    pub valid_period: ValidPeriod,

    /// IANA time zone for all time-of-day windows
    pub time_zone: String,

    /// When the operator last updated the tariff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    /// Operator display name
    pub company_name: String,

    /// Operator organisation number (operator id)
    pub company_org_no: String,

    /// Product label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    /// Energy flow direction
    pub direction: Direction,

    /// ISO 8601 billing period
    pub billing_period: String,

    /// Subscription fees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_price: Option<PriceElement>,

    /// Per-kWh fees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_price: Option<PriceElement>,

    /// Per-kW fees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_price: Option<PriceElement>,

    /// Fields outside the standard
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Tariff {
    /// Iterate over present price elements with their kind
    pub fn elements(&self) -> impl Iterator<Item = (ElementKind, &PriceElement)> {
        [
            (ElementKind::Fixed, self.fixed_price.as_ref()),
            (ElementKind::Energy, self.energy_price.as_ref()),
            (ElementKind::Power, self.power_price.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, element)| element.map(|e| (kind, e)))
    }

    /// Total number of price components across all elements
    pub fn component_count(&self) -> usize {
        self.elements().map(|(_, e)| e.components.len()).sum()
    }
}

/// Which price element of a tariff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// `fixedPrice`
    Fixed,
    /// `energyPrice`
    Energy,
    /// `powerPrice`
    Power,
}

impl ElementKind {
    /// All kinds in wire order
    pub const ALL: [ElementKind; 3] = [ElementKind::Fixed, ElementKind::Energy, ElementKind::Power];

    /// Wire key on the tariff object
    pub fn wire_key(&self) -> &'static str {
        match self {
            ElementKind::Fixed => "fixedPrice",
            ElementKind::Energy => "energyPrice",
            ElementKind::Power => "powerPrice",
        }
    }
}

/// Container of price components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceElement {
    /// Stable element id
    pub id: String,

    /// Element name
    pub name: String,

    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Expression combining the components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_function: Option<String>,

    /// Components of this element
    #[serde(default)]
    pub components: Vec<PriceComponent>,

    /// Fields outside the standard
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// One priced fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComponent {
    /// Stable component id
    pub id: String,

    /// Component name
    pub name: String,

    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Component kind
    #[serde(rename = "type")]
    pub component_type: ComponentType,

    /// Meter reference
    pub reference: String,

    /// Seasonal validity window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_period: Option<ValidPeriod>,

    /// Price of one unit (or one priced period for fixed fees)
    pub price: Price,

    /// Unit the price applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,

    /// ISO 8601 period a fixed fee covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priced_period: Option<String>,

    /// Time-of-day windows the component is active
    #[serde(default)]
    pub recurring_periods: Vec<RecurringPeriod>,

    /// How peaks are identified for peak components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_identification_settings: Option<PeakIdentificationSettings>,

    /// Fields outside the standard
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Monetary amount with VAT breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount excluding VAT
    pub price_ex_vat: f64,

    /// Amount including VAT
    pub price_inc_vat: f64,

    /// Currency of both amounts
    pub currency: Currency,

    /// VAT rate as a fraction (0.25 = 25%)
    pub vat_rate: f64,
}

impl Price {
    /// Build a price from its ex-VAT amount
    pub fn from_ex_vat(price_ex_vat: f64, vat_rate: f64, currency: Currency) -> Self {
        Self {
            price_ex_vat,
            price_inc_vat: round_price(price_ex_vat * (1.0 + vat_rate)),
            currency,
            vat_rate,
        }
    }

    /// Inc-VAT amount implied by the ex-VAT amount and rate
    pub fn expected_inc_vat(&self) -> f64 {
        self.price_ex_vat * (1.0 + self.vat_rate)
    }
}

/// Round a monetary amount to six decimals
pub fn round_price(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Recurring schedule of active windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPeriod {
    /// Meter reference
    pub reference: String,

    /// ISO 8601 recurrence frequency
    pub frequency: String,

    /// Windows within each recurrence
    #[serde(default)]
    pub active_periods: Vec<ActivePeriod>,
}

/// Window within a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePeriod {
    /// Start of the window
    pub from_including: NaiveTime,

    /// End of the window; midnight means end of day
    pub to_excluding: NaiveTime,

    /// Calendar patterns restricting which days the window applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_pattern_references: Option<CalendarPatternReference>,
}

impl ActivePeriod {
    /// Window as half-open second-of-day ranges
    ///
    /// A window wrapping past midnight yields two ranges; a zero-length
    /// window yields none.
    pub fn segments(&self) -> Vec<(u32, u32)> {
        let start = self.from_including.num_seconds_from_midnight();
        let end = match self.to_excluding.num_seconds_from_midnight() {
            0 => SECONDS_PER_DAY,
            secs => secs,
        };
        if start < end {
            vec![(start, end)]
        } else if start == end {
            Vec::new()
        } else {
            vec![(start, SECONDS_PER_DAY), (0, end)]
        }
    }

    /// Whether two windows share any instant of the day
    pub fn overlaps(&self, other: &ActivePeriod) -> bool {
        let ours = self.segments();
        let theirs = other.segments();
        ours.iter()
            .any(|(a0, a1)| theirs.iter().any(|(b0, b1)| a0 < b1 && b0 < a1))
    }

    /// Calendar selection as a comparable key
    pub fn calendar_key(&self) -> (Vec<String>, Vec<String>) {
        match &self.calendar_pattern_references {
            Some(refs) => {
                let mut include = refs.include.clone();
                let mut exclude = refs.exclude.clone();
                include.sort();
                exclude.sort();
                (include, exclude)
            }
            None => (Vec::new(), Vec::new()),
        }
    }
}

/// Calendar patterns to include or exclude
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalendarPatternReference {
    /// Patterns the window applies on
    #[serde(default)]
    pub include: Vec<String>,

    /// Patterns the window never applies on
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Settings for peak-based pricing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakIdentificationSettings {
    /// Function selecting peaks, e.g. `peak(main)`
    pub peak_function: String,

    /// Period each peak is identified within
    pub peak_identification_period: String,

    /// Duration a peak is measured over
    pub peak_duration: String,

    /// Number of peaks averaged for billing
    pub number_of_peaks_for_average_calculation: u32,
}

/// Named set of days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPattern {
    /// Reference used by active periods
    pub reference: String,

    /// ISO 8601 recurrence of the pattern
    pub frequency: String,

    /// ISO weekdays (1 = Monday)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<u8>>,

    /// Specific dates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<NaiveDate>>,
}
