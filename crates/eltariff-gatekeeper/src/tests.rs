//! Crate-level tests across normalization and validation

use crate::{Gatekeeper, ValidationConfig};
use eltariff_domain::ViolationCode;
use proptest::prelude::*;
use serde_json::{json, Value};

fn time_of_use_document() -> Value {
    json!({
        "schemaVersion": "0.1.0",
        "tariffs": [{
            "name": "Tidstariff",
            "validPeriod": {"fromIncluding": "2025-01-01", "toExcluding": "2026-01-01"},
            "companyName": "Exempel Nät AB",
            "companyOrgNo": "556000-0000",
            "energyPrice": {
                "name": "Energiöverföring",
                "components": [
                    {
                        "name": "Höglast vinter",
                        "price": {"priceExVat": 0.60},
                        "unit": "kr/kWh",
                        "validPeriod": {"fromIncluding": "2025-01-01", "toExcluding": "2025-04-01"},
                        "recurringPeriods": [{
                            "activePeriods": [{
                                "fromIncluding": "06:00",
                                "toExcluding": "22:00",
                                "calendarPatternReferences": {"include": ["weekdays"], "exclude": ["holidays"]}
                            }]
                        }]
                    },
                    {
                        "name": "Höglast vinter (nov-dec)",
                        "price": {"priceExVat": 0.60},
                        "unit": "kr/kWh",
                        "validPeriod": {"fromIncluding": "2025-11-01", "toExcluding": "2026-01-01"},
                        "recurringPeriods": [{
                            "activePeriods": [{
                                "fromIncluding": "06:00",
                                "toExcluding": "22:00",
                                "calendarPatternReferences": {"include": ["weekdays"], "exclude": ["holidays"]}
                            }]
                        }]
                    },
                    {
                        "name": "Övrig tid",
                        "price": {"priceExVat": 0.20},
                        "unit": "kWh"
                    }
                ]
            },
            "powerPrice": {
                "name": "Effektavgift",
                "components": [{
                    "name": "Effekt",
                    "type": "effekt",
                    "price": {"priceExVat": 45},
                    "unit": "kr/kW",
                    "peakIdentificationSettings": {}
                }]
            }
        }]
    })
}

#[test]
fn test_time_of_use_tariff_with_seasons() {
    let gatekeeper = Gatekeeper::new(ValidationConfig::permissive());
    let validated = gatekeeper.validate(&time_of_use_document()).unwrap();
    let tariff = &validated.model.tariffs[0];

    let peak = &tariff.power_price.as_ref().unwrap().components[0];
    let settings = peak.peak_identification_settings.as_ref().unwrap();
    assert_eq!(settings.peak_function, "peak(main)");
    assert_eq!(settings.number_of_peaks_for_average_calculation, 1);

    let window = &tariff.energy_price.as_ref().unwrap().components[0].recurring_periods[0].active_periods[0];
    assert_eq!(window.from_including.to_string(), "06:00:00");

    let refs: Vec<&str> = validated
        .model
        .calendar_patterns
        .iter()
        .map(|p| p.reference.as_str())
        .collect();
    assert_eq!(refs, vec!["weekdays", "weekends", "holidays"]);
}

#[test]
fn test_peak_component_without_settings_fails() {
    let mut document = time_of_use_document();
    let peak = document["tariffs"][0]["powerPrice"]["components"][0].as_object_mut().unwrap();
    peak.remove("peakIdentificationSettings");
    let report = Gatekeeper::new(ValidationConfig::permissive()).validate(&document).unwrap_err();
    assert_eq!(report.codes(), vec![ViolationCode::MissingPeakSettings]);
}

#[test]
fn test_seasonal_gap_detected_and_configurable() {
    // the two seasonal variants leave April to October uncovered
    let mut document = time_of_use_document();
    document["tariffs"][0]["energyPrice"]["components"][1]["validPeriod"]["fromIncluding"] = json!("2025-04-01");
    assert!(Gatekeeper::default_config().validate(&document).is_ok());

    let original = time_of_use_document();
    let report = Gatekeeper::default_config().validate(&original);
    assert!(report.unwrap_err().has(ViolationCode::CoverageGap));

    let lenient = Gatekeeper::new(ValidationConfig::permissive());
    assert!(lenient.validate(&original).is_ok());
}

#[test]
fn test_violations_accumulate_across_components() {
    let mut document = time_of_use_document();
    let components = &mut document["tariffs"][0]["energyPrice"]["components"];
    components[2]["unit"] = json!("kW");
    components[2]["price"] = json!({"priceExVat": 1.0, "priceIncVat": 2.0});

    let report = Gatekeeper::new(ValidationConfig::permissive()).validate(&document).unwrap_err();
    assert!(report.has(ViolationCode::UnitMismatch));
    assert!(report.has(ViolationCode::VatMismatch));
    assert_eq!(report.len(), 2);
}

proptest! {
    #[test]
    fn test_derived_vat_always_consistent(ex in 0.0f64..100_000.0, rate_percent in 0u32..50) {
        let mut document = time_of_use_document();
        document["tariffs"][0]["energyPrice"]["components"][2]["price"] =
            json!({"priceExVat": ex, "vatRate": f64::from(rate_percent) / 100.0});
        let validated = Gatekeeper::new(ValidationConfig::permissive()).validate(&document);
        prop_assert!(validated.is_ok());
    }

    #[test]
    fn test_inc_vat_off_by_more_than_tolerance_fails(ex in 1.0f64..10_000.0, offset in 0.02f64..100.0) {
        let mut document = time_of_use_document();
        document["tariffs"][0]["energyPrice"]["components"][2]["price"] =
            json!({"priceExVat": ex, "priceIncVat": ex * 1.25 + offset, "vatRate": 0.25});
        let report = Gatekeeper::default_config().validate(&document).unwrap_err();
        prop_assert!(report.has(ViolationCode::VatMismatch));
    }
}
