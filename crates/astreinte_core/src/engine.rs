use crate::hours::{HoursLedger, compute_hours};
use crate::schema::{DateRange, Declaration, Priority, iso_date};
use crate::slots::{Slot, SlotClass};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

/// How hours are fed to the tie-break during a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BalancingPolicy {
    /// Hours computed once from every stored declaration; picks made during
    /// the sweep do not influence each other.
    #[default]
    Snapshot,
    /// Replays every dated declaration from the earliest one on, recording
    /// each award before the next slot is resolved, so load carried from
    /// earlier months counts. N1/N2 picks and the single-cover chain keep
    /// separate tallies.
    Greedy,
}

impl std::str::FromStr for BalancingPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "snapshot" => Ok(BalancingPolicy::Snapshot),
            "greedy" => Ok(BalancingPolicy::Greedy),
            _ => Err(anyhow::anyhow!("Unknown balancing policy: {value}")),
        }
    }
}

/// Candidates holding `tier`, deduplicated, in first-seen order.
pub fn candidates_at<'a>(candidates: &[&'a Declaration], tier: Priority) -> Vec<&'a str> {
    let mut people: Vec<&str> = Vec::new();
    for declaration in candidates {
        if declaration.label == Some(tier) && !people.contains(&declaration.person.as_str()) {
            people.push(declaration.person.as_str());
        }
    }
    people
}

/// Lowest hours in `class` wins; equal hours keep the earliest candidate.
pub fn pick_least_loaded<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    ledger: &HoursLedger,
    class: SlotClass,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .min_by_key(|person| ledger.bucket(person, class))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DualAssignment {
    pub n1: Option<String>,
    pub n2: Option<String>,
}

impl DualAssignment {
    pub fn get(&self, tier: Priority) -> Option<&str> {
        match tier {
            Priority::N1 => self.n1.as_deref(),
            Priority::N2 => self.n2.as_deref(),
            Priority::Backup1 | Priority::Backup2 => None,
        }
    }
}

impl std::fmt::Display for DualAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.n1, &self.n2) {
            (Some(n1), Some(n2)) => write!(f, "N1 {n1} | N2 {n2}"),
            (Some(n1), None) => write!(f, "N1 {n1}"),
            (None, Some(n2)) => write!(f, "N2 {n2}"),
            (None, None) => Ok(()),
        }
    }
}

/// Picks N1 and N2 for one (date, slot).
///
/// Each tier is resolved among the people who declared exactly that tier.
/// One person only fills both tiers when nobody else declared either of them.
pub fn assign_dual(candidates: &[&Declaration], slot: Slot, ledger: &HoursLedger) -> DualAssignment {
    let class = slot.class();
    let n1_candidates = candidates_at(candidates, Priority::N1);
    let n2_candidates = candidates_at(candidates, Priority::N2);
    log_tie_break(slot, Priority::N1, &n1_candidates, ledger);
    log_tie_break(slot, Priority::N2, &n2_candidates, ledger);

    let mut n1 = pick_least_loaded(n1_candidates.iter().copied(), ledger, class);
    let mut n2 = pick_least_loaded(n2_candidates.iter().copied(), ledger, class);

    if let (Some(first), Some(second)) = (n1, n2) {
        if first == second {
            if n2_candidates.len() > 1 {
                n2 = pick_least_loaded(
                    n2_candidates.iter().copied().filter(|person| *person != first),
                    ledger,
                    class,
                );
            } else if n1_candidates.len() > 1 {
                n1 = pick_least_loaded(
                    n1_candidates.iter().copied().filter(|person| *person != second),
                    ledger,
                    class,
                );
            }
        }
    }

    DualAssignment {
        n1: n1.map(str::to_string),
        n2: n2.map(str::to_string),
    }
}

/// Result of the single-pick fallback chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Cover {
    Assigned {
        tier: Priority,
        person: String,
    },
    #[default]
    Absent,
}

impl Cover {
    pub fn person(&self) -> Option<&str> {
        match self {
            Cover::Assigned { person, .. } => Some(person),
            Cover::Absent => None,
        }
    }
}

impl std::fmt::Display for Cover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cover::Assigned { person, .. } => f.write_str(person),
            Cover::Absent => f.write_str("Absent"),
        }
    }
}

/// Tries N1, N2, Backup1 then Backup2 and balances hours inside the first
/// tier that has anyone.
pub fn assign_fallback(candidates: &[&Declaration], slot: Slot, ledger: &HoursLedger) -> Cover {
    for tier in Priority::TIERS {
        let people = candidates_at(candidates, tier);
        if let Some(person) = pick_least_loaded(people.iter().copied(), ledger, slot.class()) {
            return Cover::Assigned {
                tier,
                person: person.to_string(),
            };
        }
    }
    Cover::Absent
}

fn log_tie_break(slot: Slot, tier: Priority, people: &[&str], ledger: &HoursLedger) {
    if people.len() > 1 {
        let hours: Vec<(&str, u32)> = people
            .iter()
            .map(|person| (*person, ledger.bucket(person, slot.class())))
            .collect();
        tracing::debug!(%slot, %tier, ?hours, "balancing between candidates");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ScheduleCell {
    pub slot: Slot,
    pub dual: DualAssignment,
    pub cover: Cover,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ScheduleDay {
    #[serde(with = "iso_date")]
    #[schemars(with = "String")]
    pub date: Date,
    pub weekday: String,
    pub cells: Vec<ScheduleCell>,
}

impl ScheduleDay {
    pub fn cell(&self, slot: Slot) -> Option<&ScheduleCell> {
        self.cells.iter().find(|cell| cell.slot == slot)
    }
}

/// Final schedule over a date range, one cell per slot per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Schedule {
    pub policy: BalancingPolicy,
    pub days: Vec<ScheduleDay>,
}

impl Schedule {
    pub fn day(&self, date: Date) -> Option<&ScheduleDay> {
        self.days.iter().find(|day| day.date == date)
    }

    /// Hours actually awarded through N1/N2 picks.
    pub fn awarded_hours(&self) -> HoursLedger {
        let mut ledger = HoursLedger::new();
        for day in &self.days {
            for cell in &day.cells {
                for person in [&cell.dual.n1, &cell.dual.n2].into_iter().flatten() {
                    ledger.record(person, cell.slot);
                }
            }
        }
        ledger
    }
}

/// Resolves every slot of every day in `range`.
///
/// `history` is the full stored declaration set; under
/// [`BalancingPolicy::Snapshot`] it is also the source of the hours used for
/// tie-breaks. Under [`BalancingPolicy::Greedy`] the days before `range`
/// are swept too but only feed the tallies.
pub fn build_schedule(history: &[Declaration], range: DateRange, policy: BalancingPolicy) -> Schedule {
    let (mut dual_ledger, mut cover_ledger, sweep) = match policy {
        BalancingPolicy::Snapshot => {
            let hours = compute_hours(history);
            (hours.clone(), hours, range)
        }
        BalancingPolicy::Greedy => {
            let earliest = history
                .iter()
                .map(|d| d.date)
                .filter(|date| *date < range.start)
                .min()
                .unwrap_or(range.start);
            (HoursLedger::new(), HoursLedger::new(), DateRange::new(earliest, range.end))
        }
    };

    let mut by_cell: BTreeMap<(Date, Slot), Vec<&Declaration>> = BTreeMap::new();
    for declaration in history.iter().filter(|d| sweep.contains(d.date)) {
        by_cell
            .entry((declaration.date, declaration.slot))
            .or_default()
            .push(declaration);
    }

    let mut days = Vec::new();
    for date in sweep.days() {
        let mut cells = Vec::with_capacity(Slot::ALL.len());
        for slot in Slot::ALL {
            let candidates = by_cell.get(&(date, slot)).map(Vec::as_slice).unwrap_or(&[]);
            let dual = assign_dual(candidates, slot, &dual_ledger);
            let cover = assign_fallback(candidates, slot, &cover_ledger);
            if policy == BalancingPolicy::Greedy {
                for person in [&dual.n1, &dual.n2].into_iter().flatten() {
                    dual_ledger.record(person, slot);
                }
                if let Some(person) = cover.person() {
                    cover_ledger.record(person, slot);
                }
            }
            cells.push(ScheduleCell { slot, dual, cover });
        }
        if range.contains(date) {
            days.push(ScheduleDay {
                date,
                weekday: date.weekday().to_string(),
                cells,
            });
        }
    }

    tracing::debug!(?policy, days = days.len(), first_swept = %sweep.start, "schedule built");
    Schedule { policy, days }
}
