use astreinte_core::schema::Declaration;
use astreinte_core::{
    HoursLedger, Priority, Slot, assign_dual, assign_fallback, compute_hours, find_conflicts,
};
use proptest::prelude::*;
use std::collections::BTreeSet;
use time::Date;
use time::macros::date;

const PEOPLE: [&str; 4] = ["Alice", "Bob", "Carol", "Dan"];

fn arb_label() -> impl Strategy<Value = Option<Priority>> {
    prop_oneof![
        Just(None),
        Just(Some(Priority::N1)),
        Just(Some(Priority::N2)),
        Just(Some(Priority::Backup1)),
        Just(Some(Priority::Backup2)),
    ]
}

fn arb_declaration() -> impl Strategy<Value = Declaration> {
    (
        0..PEOPLE.len(),
        0..3i64,
        0..Slot::ALL.len(),
        arb_label(),
    )
        .prop_map(|(person, offset, slot, label)| {
            let day: Date = date!(2024 - 03 - 04) + time::Duration::days(offset);
            Declaration::new(day, PEOPLE[person], Slot::ALL[slot], label)
        })
}

fn arb_ledger() -> impl Strategy<Value = HoursLedger> {
    prop::collection::vec((0..20u32, 0..20u32), PEOPLE.len()).prop_map(|hours| {
        let mut ledger = HoursLedger::new();
        for (person, (day, night)) in PEOPLE.iter().zip(hours) {
            ledger.set(*person, astreinte_core::HoursTotal { day, night });
        }
        ledger
    })
}

proptest! {
    #[test]
    fn hours_ignore_declaration_order(
        (declarations, shuffled) in prop::collection::vec(arb_declaration(), 0..40)
            .prop_flat_map(|declarations| {
                let shuffled = Just(declarations.clone()).prop_shuffle();
                (Just(declarations), shuffled)
            })
    ) {
        prop_assert_eq!(compute_hours(&declarations), compute_hours(&shuffled));
    }

    #[test]
    fn dual_tier_shares_a_person_only_when_unopposed(
        declarations in prop::collection::vec(arb_declaration(), 0..12),
        ledger in arb_ledger(),
        slot_index in 0..Slot::ALL.len(),
    ) {
        let slot = Slot::ALL[slot_index];
        let candidates: Vec<&Declaration> = declarations.iter().collect();
        let picked = assign_dual(&candidates, slot, &ledger);
        if let (Some(n1), Some(n2)) = (&picked.n1, &picked.n2) {
            if n1 == n2 {
                let holders = |tier: Priority| -> BTreeSet<&str> {
                    declarations
                        .iter()
                        .filter(|d| d.label == Some(tier))
                        .map(|d| d.person.as_str())
                        .collect()
                };
                prop_assert_eq!(holders(Priority::N1).len(), 1);
                prop_assert_eq!(holders(Priority::N2).len(), 1);
            }
        }
        prop_assert_eq!(&picked, &assign_dual(&candidates, slot, &ledger));
        prop_assert_eq!(
            assign_fallback(&candidates, slot, &ledger),
            assign_fallback(&candidates, slot, &ledger)
        );
    }

    #[test]
    fn n1_conflict_iff_two_distinct_people(
        declarations in prop::collection::vec(arb_declaration(), 0..40),
    ) {
        let conflicts = find_conflicts(&declarations);
        for day_offset in 0..3i64 {
            let day = date!(2024 - 03 - 04) + time::Duration::days(day_offset);
            for slot in Slot::ALL {
                let people: BTreeSet<&str> = declarations
                    .iter()
                    .filter(|d| d.date == day && d.slot == slot && d.label == Some(Priority::N1))
                    .map(|d| d.person.as_str())
                    .collect();
                let reported = conflicts
                    .iter()
                    .any(|c| c.date == day && c.slot == slot && c.tier == Priority::N1);
                prop_assert_eq!(reported, people.len() >= 2);
            }
        }
    }
}
