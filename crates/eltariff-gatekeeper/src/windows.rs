//! Time-window rules: daily windows and seasonal validity

use crate::paths::{index, join};
use eltariff_domain::tariff::{PriceComponent, PriceElement, RecurringPeriod};
use eltariff_domain::{Violation, ViolationCode};
use std::collections::BTreeMap;

/// Daily windows sharing a calendar selection must not overlap or be empty
pub(crate) fn check_active_periods(period: &RecurringPeriod, path: &str, violations: &mut Vec<Violation>) {
    let base = join(path, "activePeriods");
    let windows = &period.active_periods;

    for (i, window) in windows.iter().enumerate() {
        if window.segments().is_empty() {
            violations.push(Violation::new(
                index(&base, i),
                ViolationCode::InvalidPeriod,
                format!(
                    "window {}-{} has zero length",
                    window.from_including, window.to_excluding
                ),
            ));
        }
    }

    for (i, earlier) in windows.iter().enumerate() {
        for (j, later) in windows.iter().enumerate().skip(i + 1) {
            if earlier.calendar_key() == later.calendar_key() && earlier.overlaps(later) {
                violations.push(Violation::new(
                    index(&base, j),
                    ViolationCode::WindowOverlap,
                    format!(
                        "window {}-{} overlaps {}",
                        later.from_including,
                        later.to_excluding,
                        index(&base, i)
                    ),
                ));
            }
        }
    }
}

/// Grouping key for seasonal variants of the same fee
fn seasonal_key(component: &PriceComponent) -> String {
    let windows: Vec<String> = component
        .recurring_periods
        .iter()
        .flat_map(|rp| {
            rp.active_periods.iter().map(move |w| {
                let (include, exclude) = w.calendar_key();
                format!(
                    "{}/{}/{}/{}/{}",
                    rp.frequency,
                    w.from_including,
                    w.to_excluding,
                    include.join("+"),
                    exclude.join("+")
                )
            })
        })
        .collect();
    format!(
        "{}|{}|{}|{}",
        component.component_type.as_str(),
        component.reference,
        component.unit.map(|u| u.as_str()).unwrap_or(""),
        windows.join(",")
    )
}

/// Seasonal variants of one fee must not overlap; optionally they must not leave gaps
pub(crate) fn check_seasonal(
    element: &PriceElement,
    path: &str,
    require_coverage: bool,
    violations: &mut Vec<Violation>,
) {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, component) in element.components.iter().enumerate() {
        if component.valid_period.is_some() {
            groups.entry(seasonal_key(component)).or_default().push(i);
        }
    }

    let components_path = join(path, "components");
    for mut members in groups.into_values().filter(|m| m.len() > 1) {
        members.sort_by_key(|&i| {
            element.components[i]
                .valid_period
                .map(|vp| vp.from_including)
        });

        for pair in members.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let (Some(prev_period), Some(next_period)) = (
                element.components[prev].valid_period,
                element.components[next].valid_period,
            ) else {
                continue;
            };
            let location = join(&index(&components_path, next), "validPeriod");

            match prev_period.to_excluding {
                None => violations.push(Violation::new(
                    location,
                    ViolationCode::WindowOverlap,
                    format!(
                        "overlaps open-ended {}",
                        index(&components_path, prev)
                    ),
                )),
                Some(end) if next_period.from_including < end => violations.push(Violation::new(
                    location,
                    ViolationCode::WindowOverlap,
                    format!(
                        "starts {} before {} ends {}",
                        next_period.from_including,
                        index(&components_path, prev),
                        end
                    ),
                )),
                Some(end) if require_coverage && next_period.from_including > end => {
                    violations.push(Violation::new(
                        location,
                        ViolationCode::CoverageGap,
                        format!(
                            "gap from {} to {} after {}",
                            end,
                            next_period.from_including,
                            index(&components_path, prev)
                        ),
                    ))
                }
                Some(_) => {}
            }
        }
    }
}
