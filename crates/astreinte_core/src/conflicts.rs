use crate::schema::{Declaration, Priority, iso_date};
use crate::slots::Slot;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use time::Date;

/// Several people declared the same top tier for one (date, slot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Conflict {
    #[serde(with = "iso_date")]
    #[schemars(with = "String")]
    pub date: Date,
    pub slot: Slot,
    pub tier: Priority,
    pub people: Vec<String>,
}

/// Groups N1 and N2 declarations by (date, slot, tier) and reports every
/// group with at least two distinct people.
///
/// Output is ordered by date, slot and tier; people keep their first-seen
/// order. Reporting a conflict does not block assignment.
pub fn find_conflicts<'a>(declarations: impl IntoIterator<Item = &'a Declaration>) -> Vec<Conflict> {
    let mut groups: BTreeMap<(Date, Slot, Priority), Vec<&str>> = BTreeMap::new();
    for declaration in declarations {
        let Some(tier) = declaration.label else {
            continue;
        };
        if !Priority::TOP.contains(&tier) {
            continue;
        }
        let people = groups
            .entry((declaration.date, declaration.slot, tier))
            .or_default();
        if !people.contains(&declaration.person.as_str()) {
            people.push(&declaration.person);
        }
    }

    groups
        .into_iter()
        .filter(|(_, people)| people.len() > 1)
        .map(|((date, slot, tier), people)| Conflict {
            date,
            slot,
            tier,
            people: people.into_iter().map(str::to_string).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn declare(day: Date, person: &str, slot: Slot, tier: Priority) -> Declaration {
        Declaration::new(day, person, slot, Some(tier))
    }

    #[test]
    fn two_n1_on_the_same_slot_conflict() {
        let monday = date!(2024 - 03 - 04);
        let declarations = vec![
            declare(monday, "Alice", Slot::EarlyMorning, Priority::N1),
            declare(monday, "Bob", Slot::EarlyMorning, Priority::N1),
        ];
        let conflicts = find_conflicts(&declarations);
        assert_eq!(
            conflicts,
            vec![Conflict {
                date: monday,
                slot: Slot::EarlyMorning,
                tier: Priority::N1,
                people: vec!["Alice".to_string(), "Bob".to_string()],
            }]
        );
    }

    #[test]
    fn backups_and_distinct_cells_never_conflict() {
        let monday = date!(2024 - 03 - 04);
        let tuesday = date!(2024 - 03 - 05);
        let declarations = vec![
            declare(monday, "Alice", Slot::Night, Priority::Backup1),
            declare(monday, "Bob", Slot::Night, Priority::Backup1),
            declare(monday, "Alice", Slot::Morning, Priority::N2),
            declare(tuesday, "Bob", Slot::Morning, Priority::N2),
            declare(monday, "Carol", Slot::Afternoon, Priority::N1),
            declare(monday, "Dan", Slot::Afternoon, Priority::N2),
        ];
        assert!(find_conflicts(&declarations).is_empty());
    }

    #[test]
    fn duplicate_rows_of_one_person_are_not_a_conflict() {
        let monday = date!(2024 - 03 - 04);
        let declarations = vec![
            declare(monday, "Alice", Slot::Evening, Priority::N2),
            declare(monday, "Alice", Slot::Evening, Priority::N2),
        ];
        assert!(find_conflicts(&declarations).is_empty());
    }

    #[test]
    fn conflicts_are_ordered_by_date_slot_and_tier() {
        let monday = date!(2024 - 03 - 04);
        let tuesday = date!(2024 - 03 - 05);
        let declarations = vec![
            declare(tuesday, "Alice", Slot::Morning, Priority::N1),
            declare(tuesday, "Bob", Slot::Morning, Priority::N1),
            declare(monday, "Carol", Slot::Night, Priority::N2),
            declare(monday, "Dan", Slot::Night, Priority::N2),
            declare(monday, "Carol", Slot::Night, Priority::N1),
            declare(monday, "Eve", Slot::Night, Priority::N1),
        ];
        let keys: Vec<(Date, Slot, Priority)> = find_conflicts(&declarations)
            .into_iter()
            .map(|conflict| (conflict.date, conflict.slot, conflict.tier))
            .collect();
        assert_eq!(
            keys,
            vec![
                (monday, Slot::Night, Priority::N1),
                (monday, Slot::Night, Priority::N2),
                (tuesday, Slot::Morning, Priority::N1),
            ]
        );
    }
}
