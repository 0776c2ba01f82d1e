use crate::schema::{Declaration, Priority};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-person hours split the way the planning charts show them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PersonSummary {
    pub person: String,
    pub day_hours: u32,
    pub night_hours: u32,
    pub n1_hours: u32,
    pub n2_hours: u32,
}

impl PersonSummary {
    pub fn total(&self) -> u32 {
        self.day_hours + self.night_hours
    }
}

/// Declared working hours per person, sorted by name.
pub fn summarize<'a>(declarations: impl IntoIterator<Item = &'a Declaration>) -> Vec<PersonSummary> {
    let mut by_person: BTreeMap<&str, PersonSummary> = BTreeMap::new();
    for declaration in declarations {
        let Some(tier) = declaration.label else {
            continue;
        };
        let hours = declaration.slot.hours();
        let entry = by_person
            .entry(&declaration.person)
            .or_insert_with(|| PersonSummary {
                person: declaration.person.clone(),
                ..PersonSummary::default()
            });
        if declaration.slot.is_night() {
            entry.night_hours += hours;
        } else {
            entry.day_hours += hours;
        }
        match tier {
            Priority::N1 => entry.n1_hours += hours,
            Priority::N2 => entry.n2_hours += hours,
            Priority::Backup1 | Priority::Backup2 => {}
        }
    }
    by_person.into_values().collect()
}
