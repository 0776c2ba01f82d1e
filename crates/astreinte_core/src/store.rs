use crate::error::StoreError;
use crate::repository::ScheduleRepository;
use crate::schema::{DateRange, DayPlan, Declaration, SlotLabels, StandardTemplate, week_start};
use std::collections::BTreeMap;
use time::{Date, Duration, Month};

/// Declared preferences, with standard templates filling weeks a person
/// has not planned yet.
pub struct PreferenceStore<R> {
    repository: R,
}

impl<R: ScheduleRepository> PreferenceStore<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_inner(self) -> R {
        self.repository
    }

    /// Every dated row, with person names trimmed.
    pub fn history(&self) -> Result<Vec<DayPlan>, StoreError> {
        let mut plans = self.repository.load_all()?;
        for plan in &mut plans {
            let trimmed = plan.person.trim();
            if trimmed.len() != plan.person.len() {
                plan.person = trimmed.to_string();
            }
        }
        plans.retain(|plan| !plan.person.is_empty());
        Ok(plans)
    }

    /// Template for `person`, or all-empty labels when none was saved.
    pub fn standard(&self, person: &str) -> Result<StandardTemplate, StoreError> {
        let template = self.repository.load_standard(person)?;
        Ok(template.unwrap_or_else(|| StandardTemplate::new(person, SlotLabels::default())))
    }

    /// Declarations of one person (or everyone) over `range`.
    ///
    /// For each week, a person's dated rows are used when at least one falls
    /// inside the range; otherwise their standard template is applied to
    /// every day. Output is ordered by date, then person, then slot.
    pub fn declarations(&self, person: Option<&str>, range: DateRange) -> Result<Vec<Declaration>, StoreError> {
        let history = self.history()?;
        let people: Vec<String> = match person {
            Some(person) => vec![person.to_string()],
            None => self.known_people(&history)?,
        };

        let mut rows: Vec<(usize, DayPlan)> = Vec::new();
        for (order, person) in people.iter().enumerate() {
            for week in weeks_within(range) {
                for plan in self.rows_for(&history, person, week)? {
                    rows.push((order, plan));
                }
            }
        }
        rows.sort_by_key(|(order, plan)| (plan.date, *order));

        Ok(rows
            .iter()
            .flat_map(|(_, plan)| plan.declarations())
            .collect())
    }

    /// Seven rows, Monday first, for the week containing `day`.
    pub fn week_for(&self, person: &str, day: Date) -> Result<Vec<DayPlan>, StoreError> {
        let history = self.history()?;
        self.rows_for(&history, person, DateRange::week_of(day))
    }

    /// Like [`Self::week_for`] but limited to the days of `month`. Dated
    /// rows outside the month do not hide the template for the days inside.
    pub fn week_for_in_month(&self, person: &str, day: Date, month: Month) -> Result<Vec<DayPlan>, StoreError> {
        let mut days = DateRange::week_of(day).days().filter(|date| date.month() == month);
        let Some(first) = days.next() else {
            return Ok(Vec::new());
        };
        let last = days.last().unwrap_or(first);
        let history = self.history()?;
        self.rows_for(&history, person, DateRange::new(first, last))
    }

    /// Replaces `person`'s rows for the dates present in `rows`.
    ///
    /// `rows` is only borrowed, so a failed save leaves the caller's copy
    /// intact for a retry.
    pub fn save_week(&mut self, person: &str, rows: &[DayPlan]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Err(StoreError::EmptyPlanning {
                person: person.to_string(),
            });
        }
        let stamped: Vec<DayPlan> = rows
            .iter()
            .map(|row| DayPlan::new(row.date, person, row.labels))
            .collect();
        self.repository.save_for_person(person, &stamped)?;
        tracing::info!(%person, rows = stamped.len(), "week planning saved");
        Ok(stamped.len())
    }

    pub fn save_standard(&mut self, person: &str, labels: SlotLabels) -> Result<(), StoreError> {
        self.repository
            .save_standard(&StandardTemplate::new(person, labels))?;
        tracing::info!(%person, "standard planning saved");
        Ok(())
    }

    /// Saves the first row of an edited week as the person's template.
    pub fn save_standard_from_rows(&mut self, person: &str, rows: &[DayPlan]) -> Result<(), StoreError> {
        let first = rows.first().ok_or_else(|| StoreError::EmptyPlanning {
            person: person.to_string(),
        })?;
        self.save_standard(person, first.labels)
    }

    fn known_people(&self, history: &[DayPlan]) -> Result<Vec<String>, StoreError> {
        let mut people: Vec<String> = Vec::new();
        let templates = self.repository.load_standards()?;
        let names = history
            .iter()
            .map(|plan| plan.person.as_str())
            .chain(templates.iter().map(|template| template.person.trim()));
        for name in names {
            if !name.is_empty() && !people.iter().any(|known| known == name) {
                people.push(name.to_string());
            }
        }
        Ok(people)
    }

    fn rows_for(&self, history: &[DayPlan], person: &str, range: DateRange) -> Result<Vec<DayPlan>, StoreError> {
        let dated: Vec<DayPlan> = history
            .iter()
            .filter(|plan| plan.person == person && range.contains(plan.date))
            .cloned()
            .collect();
        if !dated.is_empty() {
            let mut by_date: BTreeMap<Date, Vec<DayPlan>> = BTreeMap::new();
            for plan in dated {
                by_date.entry(plan.date).or_default().push(plan);
            }
            return Ok(by_date.into_values().flatten().collect());
        }

        let template = self.standard(person)?;
        Ok(range.days().map(|day| template.apply(day)).collect())
    }
}

/// Splits `range` at Monday boundaries.
fn weeks_within(range: DateRange) -> Vec<DateRange> {
    let mut weeks = Vec::new();
    let mut start = range.start;
    while start <= range.end {
        let sunday = week_start(start) + Duration::days(6);
        let end = sunday.min(range.end);
        weeks.push(DateRange::new(start, end));
        match end.next_day() {
            Some(next) => start = next,
            None => break,
        }
    }
    weeks
}
