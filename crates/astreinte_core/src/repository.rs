use crate::error::RepositoryError;
use crate::schema::{DayPlan, StandardTemplate};
use std::collections::BTreeSet;
use time::Date;

/// Flat tabular storage for planning rows and standard templates.
///
/// Missing storage is not an error: implementations return empty results.
pub trait ScheduleRepository {
    fn load_all(&self) -> Result<Vec<DayPlan>, RepositoryError>;

    /// Replaces every row of `person` whose date appears in `rows`.
    fn save_for_person(&mut self, person: &str, rows: &[DayPlan]) -> Result<(), RepositoryError>;

    fn load_standards(&self) -> Result<Vec<StandardTemplate>, RepositoryError>;

    fn load_standard(&self, person: &str) -> Result<Option<StandardTemplate>, RepositoryError> {
        Ok(self
            .load_standards()?
            .into_iter()
            .find(|template| template.person == person))
    }

    /// Replaces the single template row of `template.person`.
    fn save_standard(&mut self, template: &StandardTemplate) -> Result<(), RepositoryError>;
}

/// In-process repository for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    plans: Vec<DayPlan>,
    standards: Vec<StandardTemplate>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: Vec<DayPlan>) -> Self {
        Self {
            plans,
            standards: Vec::new(),
        }
    }

    pub fn with_standard(mut self, template: StandardTemplate) -> Self {
        self.standards.push(template);
        self
    }
}

impl ScheduleRepository for MemoryRepository {
    fn load_all(&self) -> Result<Vec<DayPlan>, RepositoryError> {
        Ok(self.plans.clone())
    }

    fn save_for_person(&mut self, person: &str, rows: &[DayPlan]) -> Result<(), RepositoryError> {
        let dates: BTreeSet<Date> = rows.iter().map(|row| row.date).collect();
        self.plans
            .retain(|plan| !(plan.person.trim() == person && dates.contains(&plan.date)));
        self.plans.extend(rows.iter().cloned());
        Ok(())
    }

    fn load_standards(&self) -> Result<Vec<StandardTemplate>, RepositoryError> {
        Ok(self.standards.clone())
    }

    fn save_standard(&mut self, template: &StandardTemplate) -> Result<(), RepositoryError> {
        self.standards
            .retain(|existing| existing.person != template.person);
        self.standards.push(template.clone());
        Ok(())
    }
}
