use crate::slots::{SLOT_COUNT, Slot};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month};

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Declared on-call tier, in descending order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Priority {
    N1,
    N2,
    Backup1,
    Backup2,
}

impl Priority {
    /// Tiers tried in order by the fallback chain.
    pub const TIERS: [Priority; 4] = [
        Priority::N1,
        Priority::N2,
        Priority::Backup1,
        Priority::Backup2,
    ];

    /// Tiers shown side by side in the final schedule.
    pub const TOP: [Priority; 2] = [Priority::N1, Priority::N2];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::N1 => "N1",
            Priority::N2 => "N2",
            Priority::Backup1 => "Backup1",
            Priority::Backup2 => "Backup2",
        }
    }

    /// Normalizes a stored cell. Empty cells, `Absent` and anything outside
    /// the four tiers read as no declaration.
    pub fn parse_label(raw: &str) -> Option<Priority> {
        let trimmed = raw.trim();
        let parsed = Priority::TIERS
            .into_iter()
            .find(|tier| tier.as_str() == trimmed);
        if parsed.is_none() && !trimmed.is_empty() && trimmed != "Absent" {
            tracing::debug!(label = trimmed, "unknown priority label treated as empty");
        }
        parsed
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One label per slot of a day, serialized as `{"07h-09h": "N1", ...}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<String>>",
    into = "BTreeMap<String, String>"
)]
pub struct SlotLabels([Option<Priority>; SLOT_COUNT]);

impl SlotLabels {
    pub fn get(&self, slot: Slot) -> Option<Priority> {
        self.0[slot.index()]
    }

    pub fn set(&mut self, slot: Slot, label: Option<Priority>) {
        self.0[slot.index()] = label;
    }

    pub fn with(mut self, slot: Slot, label: Priority) -> Self {
        self.set(slot, Some(label));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, Option<Priority>)> + '_ {
        Slot::ALL.into_iter().map(|slot| (slot, self.get(slot)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Builds labels from `(column, cell)` pairs. Columns that are not slots
    /// are ignored and slots without a column stay empty.
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        let mut labels = SlotLabels::default();
        for (column, cell) in columns {
            if let Some(slot) = Slot::from_column(column) {
                let label = cell.and_then(Priority::parse_label);
                // A filled cell wins over an empty alias column.
                if label.is_some() || labels.get(slot).is_none() {
                    labels.set(slot, label);
                }
            }
        }
        labels
    }
}

impl JsonSchema for SlotLabels {
    fn schema_name() -> String {
        "SlotLabels".to_string()
    }

    fn is_referenceable() -> bool {
        false
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        <BTreeMap<String, String>>::json_schema(generator)
    }
}

impl From<BTreeMap<String, Option<String>>> for SlotLabels {
    fn from(columns: BTreeMap<String, Option<String>>) -> Self {
        SlotLabels::from_columns(
            columns
                .iter()
                .map(|(column, cell)| (column.as_str(), cell.as_deref())),
        )
    }
}

impl From<SlotLabels> for BTreeMap<String, String> {
    fn from(labels: SlotLabels) -> Self {
        labels
            .iter()
            .map(|(slot, label)| {
                let cell = label.map(Priority::as_str).unwrap_or_default();
                (slot.label().to_string(), cell.to_string())
            })
            .collect()
    }
}

/// A person's declarations for one date; one row of the planning table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DayPlan {
    #[serde(rename = "Date", with = "iso_date")]
    #[schemars(with = "String")]
    pub date: Date,
    #[serde(rename = "Utilisateur", default)]
    pub person: String,
    #[serde(flatten)]
    pub labels: SlotLabels,
}

impl DayPlan {
    pub fn new(date: Date, person: impl Into<String>, labels: SlotLabels) -> Self {
        Self {
            date,
            person: person.into(),
            labels,
        }
    }

    pub fn empty(date: Date, person: impl Into<String>) -> Self {
        Self::new(date, person, SlotLabels::default())
    }

    /// Derived `Jour` column.
    pub fn weekday_name(&self) -> String {
        weekday_name(self.date)
    }

    pub fn declarations(&self) -> impl Iterator<Item = Declaration> + '_ {
        self.labels.iter().map(|(slot, label)| Declaration {
            date: self.date,
            person: self.person.clone(),
            slot,
            label,
        })
    }
}

/// A person's recurring week template, one row per person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StandardTemplate {
    #[serde(rename = "Utilisateur", default)]
    pub person: String,
    #[serde(flatten)]
    pub labels: SlotLabels,
}

impl StandardTemplate {
    pub fn new(person: impl Into<String>, labels: SlotLabels) -> Self {
        Self {
            person: person.into(),
            labels,
        }
    }

    pub fn apply(&self, date: Date) -> DayPlan {
        DayPlan::new(date, self.person.clone(), self.labels)
    }
}

/// `(person, date, slot, label)`; several people may declare the same tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub struct Declaration {
    #[serde(with = "iso_date")]
    #[schemars(with = "String")]
    pub date: Date,
    pub person: String,
    pub slot: Slot,
    pub label: Option<Priority>,
}

impl Declaration {
    pub fn new(date: Date, person: impl Into<String>, slot: Slot, label: Option<Priority>) -> Self {
        Self {
            date,
            person: person.into(),
            slot,
            label,
        }
    }
}

pub fn flatten(plans: &[DayPlan]) -> Vec<Declaration> {
    plans.iter().flat_map(DayPlan::declarations).collect()
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn single(date: Date) -> Self {
        Self::new(date, date)
    }

    /// Monday to Sunday week containing `date`.
    pub fn week_of(date: Date) -> Self {
        let start = week_start(date);
        Self::new(start, start + Duration::days(6))
    }

    pub fn month(year: i32, month: Month) -> anyhow::Result<Self> {
        let start = Date::from_calendar_date(year, month, 1)?;
        let mut end = start;
        while let Some(next) = end.next_day() {
            if next.month() != month {
                break;
            }
            end = next;
        }
        Ok(Self::new(start, end))
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(self) -> impl Iterator<Item = Date> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |day| {
            day.next_day().filter(|next| *next <= end)
        })
    }
}

pub fn week_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_monday()))
}

pub fn weekday_name(date: Date) -> String {
    date.weekday().to_string()
}

/// Parses `YYYY-MM-DD`, ignoring a trailing time part
/// (`2024-03-04 00:00:00`, `2024-03-04T00:00:00`) as spreadsheet exports write it.
pub fn parse_date(raw: &str) -> anyhow::Result<Date> {
    let day = raw.trim().split(['T', ' ']).next().unwrap_or_default();
    Ok(Date::parse(day, DATE_FORMAT)?)
}

pub fn format_date(date: Date) -> String {
    // DATE_FORMAT only has calendar components, which every Date carries.
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Parses `YYYY-MM`.
pub fn parse_month(raw: &str) -> anyhow::Result<DateRange> {
    let (year, month) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("Expected YYYY-MM, got {raw}"))?;
    let year: i32 = year.parse()?;
    let month = Month::try_from(month.parse::<u8>()?)?;
    DateRange::month(year, month)
}

pub mod iso_date {
    use super::DATE_FORMAT;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = date.format(DATE_FORMAT).map_err(S::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn unknown_labels_normalize_to_none() {
        assert_eq!(Priority::parse_label(" N1 "), Some(Priority::N1));
        assert_eq!(Priority::parse_label("Backup2"), Some(Priority::Backup2));
        assert_eq!(Priority::parse_label("Absent"), None);
        assert_eq!(Priority::parse_label("n1"), None);
        assert_eq!(Priority::parse_label("nan"), None);
        assert_eq!(Priority::parse_label(""), None);
    }

    #[test]
    fn day_plan_reads_tabular_json() {
        let raw = r#"{
            "Date": "2024-03-04",
            "Jour": "Monday",
            "Utilisateur": "Alice",
            "07h-09h": "N1",
            "12h-14h": "Backup1",
            "19h-00h": "whatever",
            "00h-07h": null
        }"#;
        let plan: DayPlan = serde_json::from_str(raw).unwrap();
        assert_eq!(plan.date, date!(2024 - 03 - 04));
        assert_eq!(plan.person, "Alice");
        assert_eq!(plan.labels.get(Slot::EarlyMorning), Some(Priority::N1));
        assert_eq!(plan.labels.get(Slot::Midday), Some(Priority::Backup1));
        assert_eq!(plan.labels.get(Slot::Night), None);
        assert_eq!(plan.labels.get(Slot::Morning), None);
        assert_eq!(plan.weekday_name(), "Monday");
    }

    #[test]
    fn day_plan_writes_every_slot_column() {
        let plan = DayPlan::new(
            date!(2024 - 03 - 05),
            "Bob",
            SlotLabels::default().with(Slot::Overnight, Priority::N2),
        );
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["Date"], "2024-03-05");
        assert_eq!(value["Utilisateur"], "Bob");
        assert_eq!(value["00h-07h"], "N2");
        assert_eq!(value["07h-09h"], "");
        assert_eq!(value.as_object().unwrap().len(), 2 + Slot::ALL.len());
    }

    #[test]
    fn week_of_starts_on_monday() {
        let week = DateRange::week_of(date!(2024 - 03 - 07));
        assert_eq!(week.start, date!(2024 - 03 - 04));
        assert_eq!(week.end, date!(2024 - 03 - 10));
        assert_eq!(week.days().count(), 7);
    }

    #[test]
    fn month_range_handles_leap_february() {
        let february = parse_month("2024-02").unwrap();
        assert_eq!(february.start, date!(2024 - 02 - 01));
        assert_eq!(february.end, date!(2024 - 02 - 29));
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("march").is_err());
    }

    #[test]
    fn declarations_cover_every_slot() {
        let plan = DayPlan::empty(date!(2024 - 03 - 04), "Alice");
        let declarations: Vec<Declaration> = plan.declarations().collect();
        assert_eq!(declarations.len(), Slot::ALL.len());
        assert!(declarations.iter().all(|d| d.label.is_none()));
    }
}
