//! Property tests for the ranking comparator and the status classifier.

use holdshelf_core::{HoldingEntry, OrderTable, RankingConfig};
use holdshelf_holdings::{natural_cmp, HoldingsRanker, StatusClassifier};
use proptest::prelude::*;
use std::cmp::Ordering;

fn ranker() -> HoldingsRanker {
    HoldingsRanker::new(RankingConfig {
        branch_order: OrderTable::parse("MAIN:WEST=3:EAST/REF").unwrap(),
        location_order: OrderTable::parse("REF:STACKS").unwrap(),
        sort_by_enum_chron: true,
        ..Default::default()
    })
}

prop_compose! {
    fn arb_entry()(
        branch in prop::sample::select(vec!["MAIN", "WEST", "EAST", "NORTH"]),
        location in prop::option::of(prop::sample::select(vec!["REF", "STACKS", "KIDS"])),
        label in "[A-Za-z ]{0,6}",
        enumeration in prop::option::of(prop_oneof![
            "[0-9]{1,4}(:[0-9]{1,2})?",
            "[0-9\u{660}-\u{669}:]{1,4}",
        ]),
        available in any::<bool>(),
    ) -> HoldingEntry {
        HoldingEntry {
            id: "bib".to_string(),
            item_id: String::new(),
            holding_group_id: None,
            available,
            status: String::new(),
            location_label: label,
            location_code: location.map(String::from),
            branch_code: branch.to_string(),
            call_number: String::new(),
            due_date: None,
            requests_placed: 0,
            sort_key: 0,
            enumeration,
            barcode: None,
            department: None,
            notes: Vec::new(),
            detail_pending: false,
        }
    }
}

fn with_sort_keys(mut entries: Vec<HoldingEntry>) -> Vec<HoldingEntry> {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.sort_key = i;
        entry.item_id = format!("i{i}");
    }
    entries
}

proptest! {
    #[test]
    fn prop_comparator_is_antisymmetric(entries in prop::collection::vec(arb_entry(), 2..12)) {
        let entries = with_sort_keys(entries);
        let ranker = ranker();
        for a in &entries {
            for b in &entries {
                let ab = ranker.compare(a, b);
                prop_assert_eq!(ab, ranker.compare(b, a).reverse());
                if a.sort_key != b.sort_key {
                    prop_assert_ne!(ab, Ordering::Equal);
                }
            }
        }
    }

    #[test]
    fn prop_sort_ignores_input_order(entries in prop::collection::vec(arb_entry(), 0..12)) {
        let entries = with_sort_keys(entries);
        let ranker = ranker();

        let mut forward = entries.clone();
        ranker.sort(&mut forward);
        let mut backward: Vec<HoldingEntry> = entries.into_iter().rev().collect();
        ranker.sort(&mut backward);

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_summary_bounds(entries in prop::collection::vec(arb_entry(), 0..12)) {
        let summary = ranker().summarize(&with_sort_keys(entries));
        prop_assert!(summary.available <= summary.total);
        prop_assert!(summary.locations <= summary.total);
    }

    #[test]
    fn prop_natural_cmp_is_antisymmetric(a in "[a-z0-9:]{0,8}", b in "[a-z0-9:]{0,8}") {
        prop_assert_eq!(natural_cmp(&a, &b), natural_cmp(&b, &a).reverse());
    }

    #[test]
    fn prop_natural_cmp_is_transitive(
        mut values in prop::collection::vec("[a0-9\u{660}-\u{663}]{0,4}", 3),
    ) {
        values.sort_by(|a, b| natural_cmp(a, b));
        prop_assert_ne!(natural_cmp(&values[0], &values[1]), Ordering::Greater);
        prop_assert_ne!(natural_cmp(&values[1], &values[2]), Ordering::Greater);
        prop_assert_ne!(natural_cmp(&values[0], &values[2]), Ordering::Greater);
    }

    #[test]
    fn prop_unranked_tie_keeps_first(signals in prop::collection::vec("[a-z]{1,5}", 1..6)) {
        // None of these are ranked, so every signal ties.
        let classifier = StatusClassifier::default();
        prop_assert_eq!(classifier.pick_status(signals.as_slice()), Some(signals[0].as_str()));
    }
}
