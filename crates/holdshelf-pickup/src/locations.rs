//! Pickup-location lists
//!
//! Builds the ordered list offered to the patron from the location catalog
//! and an [`Eligibility`], and validates a previously chosen location.

use crate::engine::{Eligibility, PickupRequest};
use holdshelf_core::{PickupConfig, PickupLocation, PickupOrder};
use serde::Serialize;
use std::cmp::Ordering;

pub const HOME_ADDRESS_ID: &str = "home_address";
pub const WORK_ADDRESS_ID: &str = "work_address";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Location,
    HomeAddress,
    WorkAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupOption {
    pub location_id: String,
    pub label: String,
    pub kind: PickupKind,
}

/// Real locations in display order, then any address options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PickupOptions(Vec<PickupOption>);

impl PickupOptions {
    pub fn build(
        catalog: &[PickupLocation],
        eligibility: &Eligibility,
        request: &PickupRequest,
        config: &PickupConfig,
    ) -> Self {
        let mut locations: Vec<&PickupLocation> = catalog
            .iter()
            .filter(|l| eligibility.allows(&l.location_id))
            .filter(|l| !config.exclude.contains(&l.location_id))
            .collect();
        sort_locations(&mut locations, &config.order);

        let mut options: Vec<PickupOption> = locations
            .into_iter()
            .map(|l| PickupOption {
                location_id: l.location_id.clone(),
                label: l.label.clone(),
                kind: PickupKind::Location,
            })
            .collect();

        let home = request.home_address.as_deref().filter(|_| eligibility.home);
        let work = request.work_address.as_deref().filter(|_| eligibility.work);
        if let Some(address) = home {
            options.push(PickupOption {
                location_id: HOME_ADDRESS_ID.to_string(),
                label: address.to_string(),
                kind: PickupKind::HomeAddress,
            });
        }
        if let Some(address) = work {
            if home != Some(address) {
                options.push(PickupOption {
                    location_id: WORK_ADDRESS_ID.to_string(),
                    label: address.to_string(),
                    kind: PickupKind::WorkAddress,
                });
            }
        }

        Self(options)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PickupOption> {
        self.0.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|o| o.location_id.as_str()).collect()
    }

    /// Whether a previously chosen pickup id may still be used.
    pub fn is_valid(&self, location_id: &str) -> bool {
        self.0.iter().any(|o| o.location_id == location_id)
    }

    /// `preferred` when valid, else the first option.
    pub fn default_location(&self, preferred: Option<&str>) -> Option<&PickupOption> {
        preferred
            .and_then(|id| self.0.iter().find(|o| o.location_id == id))
            .or_else(|| self.0.first())
    }
}

impl IntoIterator for PickupOptions {
    type Item = PickupOption;
    type IntoIter = std::vec::IntoIter<PickupOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn sort_locations(locations: &mut [&PickupLocation], order: &PickupOrder) {
    match order {
        PickupOrder::Catalog => {}
        PickupOrder::Alphabetical => locations.sort_by(|a, b| cmp_labels(a, b)),
        PickupOrder::Explicit(ids) => {
            let position = |l: &PickupLocation| ids.iter().position(|id| *id == l.location_id);
            locations.sort_by(|a, b| match (position(a), position(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => cmp_labels(a, b),
            });
        }
    }
}

fn cmp_labels(a: &PickupLocation, b: &PickupLocation) -> Ordering {
    a.label
        .to_lowercase()
        .cmp(&b.label.to_lowercase())
        .then_with(|| a.location_id.cmp(&b.location_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate;
    use crate::engine::CandidateCopy;
    use crate::parser::parse_rules;
    use holdshelf_core::HoldLevel;

    fn catalog() -> Vec<PickupLocation> {
        vec![
            PickupLocation::new("BR2", "beta"),
            PickupLocation::new("BR1", "Alpha"),
            PickupLocation::new("BR3", "Gamma"),
        ]
    }

    fn eligible(ids: &[&str]) -> Eligibility {
        Eligibility {
            pickup: Some(ids.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    fn build(
        eligibility: &Eligibility,
        request: &PickupRequest,
        config: &PickupConfig,
    ) -> PickupOptions {
        PickupOptions::build(&catalog(), eligibility, request, config)
    }

    #[test]
    fn test_avail_rule_scenario() {
        let rules = parse_rules(&["avail=X:pickup=BR1"]).unwrap();
        let copies = [
            CandidateCopy::new("A", true).at_location("X"),
            CandidateCopy::new("A", false).at_location("Y"),
        ];
        let request = PickupRequest::new(HoldLevel::Copy);
        let eligibility = evaluate(&rules, &copies, &request);
        let catalog = [PickupLocation::new("BR1", "One"), PickupLocation::new("BR2", "Two")];

        let config = PickupConfig::default();
        let options = PickupOptions::build(&catalog, &eligibility, &request, &config);
        assert_eq!(options.ids(), vec!["BR1"]);
    }

    #[test]
    fn test_orderings() {
        let all = eligible(&["BR1", "BR2", "BR3"]);
        let request = PickupRequest::default();

        let config = PickupConfig::default();
        assert_eq!(build(&all, &request, &config).ids(), vec!["BR1", "BR2", "BR3"]);

        let config = PickupConfig {
            order: PickupOrder::Catalog,
            ..Default::default()
        };
        assert_eq!(build(&all, &request, &config).ids(), vec!["BR2", "BR1", "BR3"]);

        let config = PickupConfig {
            order: PickupOrder::Explicit(vec!["BR3".into(), "MISSING".into()]),
            ..Default::default()
        };
        assert_eq!(build(&all, &request, &config).ids(), vec!["BR3", "BR1", "BR2"]);
    }

    #[test]
    fn test_exclude_overrides_rules() {
        let config = PickupConfig {
            exclude: vec!["BR1".into()],
            ..Default::default()
        };
        let options = build(&eligible(&["BR1", "BR2"]), &PickupRequest::default(), &config);
        assert_eq!(options.ids(), vec!["BR2"]);
    }

    #[test]
    fn test_address_options_follow_locations() {
        let mut eligibility = eligible(&["BR3"]);
        eligibility.home = true;
        eligibility.work = true;

        let request = PickupRequest::default()
            .with_home_address("1 Elm St")
            .with_work_address("9 Oak Ave");
        let options = build(&eligibility, &request, &PickupConfig::default());
        assert_eq!(options.ids(), vec!["BR3", HOME_ADDRESS_ID, WORK_ADDRESS_ID]);

        let same = PickupRequest::default()
            .with_home_address("1 Elm St")
            .with_work_address("1 Elm St");
        let options = build(&eligibility, &same, &PickupConfig::default());
        assert_eq!(options.ids(), vec!["BR3", HOME_ADDRESS_ID]);

        eligibility.home = false;
        let options = build(&eligibility, &same, &PickupConfig::default());
        assert_eq!(options.ids(), vec!["BR3", WORK_ADDRESS_ID]);
    }

    #[test]
    fn test_validation_and_default() {
        let mut eligibility = eligible(&["BR1", "BR2"]);
        eligibility.home = true;
        let request = PickupRequest::default().with_home_address("1 Elm St");
        let options = build(&eligibility, &request, &PickupConfig::default());

        assert!(options.is_valid("BR2"));
        assert!(options.is_valid(HOME_ADDRESS_ID));
        assert!(!options.is_valid("BR3"));
        assert!(!options.is_valid(WORK_ADDRESS_ID));

        assert_eq!(options.default_location(Some("BR2")).unwrap().location_id, "BR2");
        assert_eq!(options.default_location(Some("BR3")).unwrap().location_id, "BR1");
        assert_eq!(options.default_location(None).unwrap().location_id, "BR1");
        assert!(PickupOptions::default().default_location(Some("BR1")).is_none());
    }

    #[test]
    fn test_options_json_shape() {
        let mut eligibility = eligible(&["BR1"]);
        eligibility.work = true;
        let request = PickupRequest::default().with_work_address("9 Oak Ave");
        let options = build(&eligibility, &request, &PickupConfig::default());

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json[0]["locationId"], "BR1");
        assert_eq!(json[0]["kind"], "location");
        assert_eq!(json[1]["locationId"], WORK_ADDRESS_ID);
        assert_eq!(json[1]["label"], "9 Oak Ave");
        assert_eq!(json[1]["kind"], "work_address");
    }
}
