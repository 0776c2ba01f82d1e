use crate::schema::Declaration;
use crate::slots::{Slot, SlotClass};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HoursTotal {
    pub day: u32,
    pub night: u32,
}

impl HoursTotal {
    pub fn bucket(&self, class: SlotClass) -> u32 {
        match class {
            SlotClass::Day => self.day,
            SlotClass::Night => self.night,
        }
    }

    pub fn total(&self) -> u32 {
        self.day + self.night
    }

    fn add(&mut self, slot: Slot) {
        match slot.class() {
            SlotClass::Day => self.day += slot.hours(),
            SlotClass::Night => self.night += slot.hours(),
        }
    }
}

/// Accumulated hours per person. People never seen count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct HoursLedger {
    totals: BTreeMap<String, HoursTotal>,
}

impl HoursLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, person: &str) -> HoursTotal {
        self.totals.get(person).copied().unwrap_or_default()
    }

    pub fn bucket(&self, person: &str, class: SlotClass) -> u32 {
        self.get(person).bucket(class)
    }

    /// Adds the slot's duration to the person's day or night bucket.
    pub fn record(&mut self, person: &str, slot: Slot) {
        self.totals.entry(person.to_string()).or_default().add(slot);
    }

    /// Overwrites a person's totals.
    pub fn set(&mut self, person: impl Into<String>, total: HoursTotal) {
        self.totals.insert(person.into(), total);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, HoursTotal)> {
        self.totals
            .iter()
            .map(|(person, total)| (person.as_str(), *total))
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Sums the slot hours of every working-tier declaration per person.
///
/// Declarations without a label contribute nothing, but their author still
/// appears in the ledger with zero hours. The result does not depend on the
/// order of `declarations`.
pub fn compute_hours<'a>(declarations: impl IntoIterator<Item = &'a Declaration>) -> HoursLedger {
    let mut ledger = HoursLedger::new();
    for declaration in declarations {
        if declaration.label.is_some() {
            ledger.record(&declaration.person, declaration.slot);
        } else {
            ledger.totals.entry(declaration.person.clone()).or_default();
        }
    }
    ledger
}
