//! Semantic rules on the typed model
//!
//! These run only once the document has the right shape. Like the
//! structural pass they accumulate every violation found.

use crate::paths::{index, join};
use crate::windows;
use crate::ValidationConfig;
use eltariff_domain::tariff::{ElementKind, Price, PriceComponent, Tariff, TariffModel};
use eltariff_domain::{ComponentType, Unit, Violation, ViolationCode};
use std::collections::HashSet;

pub(crate) struct SemanticCheck<'a> {
    config: &'a ValidationConfig,
    patterns: HashSet<&'a str>,
    violations: Vec<Violation>,
}

impl<'a> SemanticCheck<'a> {
    pub(crate) fn new(config: &'a ValidationConfig) -> Self {
        Self {
            config,
            patterns: HashSet::new(),
            violations: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, model: &'a TariffModel) -> Vec<Violation> {
        self.check_calendar_patterns(model);

        let mut tariff_ids = HashSet::new();
        for (i, tariff) in model.tariffs.iter().enumerate() {
            let path = index("tariffs", i);
            if !tariff.id.is_empty() && !tariff_ids.insert(tariff.id.as_str()) {
                self.violation(
                    join(&path, "id"),
                    ViolationCode::DuplicateId,
                    format!("tariff id {} is used more than once", tariff.id),
                );
            }
            self.check_tariff(tariff, &path);
        }
        self.violations
    }

    fn violation(&mut self, path: String, code: ViolationCode, message: impl Into<String>) {
        self.violations.push(Violation::new(path, code, message));
    }

    fn check_calendar_patterns(&mut self, model: &'a TariffModel) {
        for (i, pattern) in model.calendar_patterns.iter().enumerate() {
            let path = index("calendarPatterns", i);
            if pattern.reference.trim().is_empty() {
                self.violation(join(&path, "reference"), ViolationCode::EmptyValue, "reference is empty");
            } else if !self.patterns.insert(pattern.reference.as_str()) {
                self.violation(
                    join(&path, "reference"),
                    ViolationCode::DuplicateId,
                    format!("calendar pattern {} is defined twice", pattern.reference),
                );
            }
            if let Some(days) = &pattern.days {
                for (d, day) in days.iter().enumerate() {
                    if !(1..=7).contains(day) {
                        self.violation(
                            index(&join(&path, "days"), d),
                            ViolationCode::InvalidEnum,
                            format!("{} is not an ISO weekday (1-7)", day),
                        );
                    }
                }
            }
        }
    }

    fn check_tariff(&mut self, tariff: &Tariff, path: &str) {
        for (wire, value) in [
            ("id", &tariff.id),
            ("name", &tariff.name),
            ("companyName", &tariff.company_name),
            ("companyOrgNo", &tariff.company_org_no),
            ("timeZone", &tariff.time_zone),
        ] {
            if value.trim().is_empty() {
                self.violation(join(path, wire), ViolationCode::EmptyValue, format!("{} is empty", wire));
            }
        }

        if !tariff.valid_period.is_well_ordered() {
            self.violation(
                join(path, "validPeriod"),
                ViolationCode::InvalidPeriod,
                "toExcluding must be after fromIncluding",
            );
        }

        if tariff.component_count() == 0 {
            self.violation(
                path.to_string(),
                ViolationCode::NoComponents,
                "a tariff needs at least one price component",
            );
        }

        let mut component_ids = HashSet::new();
        for (kind, element) in tariff.elements() {
            let element_path = join(path, kind.wire_key());
            for (c, component) in element.components.iter().enumerate() {
                let component_path = index(&join(&element_path, "components"), c);
                if !component.id.is_empty() && !component_ids.insert(component.id.as_str()) {
                    self.violation(
                        join(&component_path, "id"),
                        ViolationCode::DuplicateId,
                        format!("component id {} is used more than once", component.id),
                    );
                }
                self.check_component(kind, component, tariff, &component_path);
            }
            windows::check_seasonal(
                element,
                &element_path,
                self.config.require_seasonal_coverage,
                &mut self.violations,
            );
        }
    }

    fn check_component(&mut self, kind: ElementKind, component: &PriceComponent, tariff: &Tariff, path: &str) {
        if component.name.trim().is_empty() {
            self.violation(join(path, "name"), ViolationCode::EmptyValue, "name is empty");
        }

        self.check_price(&component.price, &join(path, "price"));

        if self.config.validate_units {
            self.check_unit(kind, component, path);
        }

        if component.component_type == ComponentType::Peak {
            match &component.peak_identification_settings {
                None => self.violation(
                    join(path, "peakIdentificationSettings"),
                    ViolationCode::MissingPeakSettings,
                    "peak components need peakIdentificationSettings",
                ),
                Some(settings) if settings.number_of_peaks_for_average_calculation == 0 => self.violation(
                    join(
                        &join(path, "peakIdentificationSettings"),
                        "numberOfPeaksForAverageCalculation",
                    ),
                    ViolationCode::WrongType,
                    "at least one peak must be averaged",
                ),
                Some(_) => {}
            }
        }

        if let Some(period) = &component.valid_period {
            let period_path = join(path, "validPeriod");
            if !period.is_well_ordered() {
                self.violation(
                    period_path,
                    ViolationCode::InvalidPeriod,
                    "toExcluding must be after fromIncluding",
                );
            } else if !tariff.valid_period.contains(period) {
                self.violation(
                    period_path,
                    ViolationCode::PeriodOutsideTariff,
                    "component validity reaches outside the tariff validity",
                );
            }
        }

        for (r, recurring) in component.recurring_periods.iter().enumerate() {
            let recurring_path = index(&join(path, "recurringPeriods"), r);
            windows::check_active_periods(recurring, &recurring_path, &mut self.violations);

            for (a, active) in recurring.active_periods.iter().enumerate() {
                let Some(refs) = &active.calendar_pattern_references else {
                    continue;
                };
                let refs_path = join(
                    &index(&join(&recurring_path, "activePeriods"), a),
                    "calendarPatternReferences",
                );
                for reference in refs.include.iter().chain(&refs.exclude) {
                    if !self.patterns.contains(reference.as_str()) {
                        self.violation(
                            refs_path.clone(),
                            ViolationCode::UnknownCalendarPattern,
                            format!("calendar pattern {} is not defined", reference),
                        );
                    }
                }
            }
        }
    }

    fn check_price(&mut self, price: &Price, path: &str) {
        for (wire, amount) in [("priceExVat", price.price_ex_vat), ("priceIncVat", price.price_inc_vat)] {
            if !amount.is_finite() {
                self.violation(join(path, wire), ViolationCode::InvalidAmount, "amount is not a finite number");
            }
        }

        if !(0.0..1.0).contains(&price.vat_rate) {
            self.violation(
                join(path, "vatRate"),
                ViolationCode::InvalidVatRate,
                format!("VAT rate {} is outside [0, 1)", price.vat_rate),
            );
            return;
        }

        if !self
            .config
            .vat_consistent(price.price_ex_vat, price.price_inc_vat, price.vat_rate)
        {
            self.violation(
                join(path, "priceIncVat"),
                ViolationCode::VatMismatch,
                format!(
                    "priceIncVat {} does not match priceExVat {} at VAT rate {} (expected {:.6})",
                    price.price_inc_vat,
                    price.price_ex_vat,
                    price.vat_rate,
                    price.expected_inc_vat()
                ),
            );
        }
    }

    fn check_unit(&mut self, kind: ElementKind, component: &PriceComponent, path: &str) {
        let unit_path = join(path, "unit");
        match kind {
            ElementKind::Energy => {
                if component.unit != Some(Unit::KWh) {
                    self.violation(unit_path, ViolationCode::UnitMismatch, "energy prices are per kWh");
                }
            }
            ElementKind::Power => {
                if !matches!(component.unit, Some(Unit::KW) | Some(Unit::KVAr)) {
                    self.violation(unit_path, ViolationCode::UnitMismatch, "power prices are per kW or kVAr");
                }
            }
            ElementKind::Fixed => {
                if let Some(unit) = component.unit {
                    self.violation(
                        unit_path,
                        ViolationCode::UnitMismatch,
                        format!("fixed fees carry no unit, found {}", unit),
                    );
                }
                if component.priced_period.is_none() {
                    self.violation(
                        join(path, "pricedPeriod"),
                        ViolationCode::MissingField,
                        "fixed fees need a pricedPeriod",
                    );
                }
            }
        }
    }
}
