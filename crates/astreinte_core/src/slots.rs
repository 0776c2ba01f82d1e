use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Balancing bucket a slot's hours are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlotClass {
    Day,
    Night,
}

/// Fixed coverage slots of a calendar day, in display order.
///
/// The five day slots cover 07h-19h and the two night slots cover 19h-07h,
/// so together they partition the 24 hours of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Slot {
    #[serde(rename = "07h-09h")]
    EarlyMorning,
    #[serde(rename = "09h-12h")]
    Morning,
    #[serde(rename = "12h-15h", alias = "12h-14h")]
    Midday,
    #[serde(rename = "15h-18h")]
    Afternoon,
    #[serde(rename = "18h-19h")]
    Evening,
    #[serde(rename = "19h-00h")]
    Night,
    #[serde(rename = "00h-07h")]
    Overnight,
}

pub const SLOT_COUNT: usize = 7;

impl Slot {
    pub const ALL: [Slot; SLOT_COUNT] = [
        Slot::EarlyMorning,
        Slot::Morning,
        Slot::Midday,
        Slot::Afternoon,
        Slot::Evening,
        Slot::Night,
        Slot::Overnight,
    ];

    /// Column header used in tabular storage and reports.
    pub fn label(self) -> &'static str {
        match self {
            Slot::EarlyMorning => "07h-09h",
            Slot::Morning => "09h-12h",
            Slot::Midday => "12h-15h",
            Slot::Afternoon => "15h-18h",
            Slot::Evening => "18h-19h",
            Slot::Night => "19h-00h",
            Slot::Overnight => "00h-07h",
        }
    }

    /// Start and end hour; an end of 24 means midnight.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            Slot::EarlyMorning => (7, 9),
            Slot::Morning => (9, 12),
            Slot::Midday => (12, 15),
            Slot::Afternoon => (15, 18),
            Slot::Evening => (18, 19),
            Slot::Night => (19, 24),
            Slot::Overnight => (0, 7),
        }
    }

    pub fn hours(self) -> u32 {
        let (start, end) = self.bounds();
        end - start
    }

    pub fn class(self) -> SlotClass {
        match self {
            Slot::Night | Slot::Overnight => SlotClass::Night,
            _ => SlotClass::Day,
        }
    }

    pub fn is_night(self) -> bool {
        self.class() == SlotClass::Night
    }

    /// Position in [`Slot::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolves a stored column name, accepting the legacy `12h-14h` header.
    pub fn from_column(name: &str) -> Option<Slot> {
        let name = name.trim();
        if name == LEGACY_MIDDAY {
            return Some(Slot::Midday);
        }
        Slot::ALL.into_iter().find(|slot| slot.label() == name)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Header written by older planning files for the midday slot.
pub const LEGACY_MIDDAY: &str = "12h-14h";

pub fn day_slots() -> impl Iterator<Item = Slot> {
    Slot::ALL.into_iter().filter(|slot| !slot.is_night())
}

pub fn night_slots() -> impl Iterator<Item = Slot> {
    Slot::ALL.into_iter().filter(|slot| slot.is_night())
}

pub fn total_hours(slots: impl IntoIterator<Item = Slot>) -> u32 {
    slots.into_iter().map(Slot::hours).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_a_full_day_once() {
        let mut covered = [0u8; 24];
        for slot in Slot::ALL {
            let (start, end) = slot.bounds();
            for hour in start..end {
                covered[hour as usize] += 1;
            }
        }
        assert!(covered.iter().all(|count| *count == 1), "{covered:?}");
        assert_eq!(total_hours(day_slots()) + total_hours(night_slots()), 24);
    }

    #[test]
    fn day_and_night_partitions_are_disjoint() {
        let day: Vec<Slot> = day_slots().collect();
        let night: Vec<Slot> = night_slots().collect();
        assert_eq!(day.len(), 5);
        assert_eq!(night, vec![Slot::Night, Slot::Overnight]);
        assert!(day.iter().all(|slot| !night.contains(slot)));
        assert_eq!(total_hours(day), 12);
    }

    #[test]
    fn index_matches_catalog_order() {
        for (position, slot) in Slot::ALL.into_iter().enumerate() {
            assert_eq!(slot.index(), position);
        }
    }

    #[test]
    fn column_lookup_accepts_legacy_midday() {
        assert_eq!(Slot::from_column("12h-14h"), Some(Slot::Midday));
        assert_eq!(Slot::from_column(" 19h-00h "), Some(Slot::Night));
        assert_eq!(Slot::from_column("Date"), None);
    }

    #[test]
    fn serde_uses_column_labels() {
        let json = serde_json::to_string(&Slot::Overnight).unwrap();
        assert_eq!(json, "\"00h-07h\"");
        let legacy: Slot = serde_json::from_str("\"12h-14h\"").unwrap();
        assert_eq!(legacy, Slot::Midday);
    }
}
