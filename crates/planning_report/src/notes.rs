use anyhow::Result;
use astreinte_core::conflicts::Conflict;
use astreinte_core::engine::Schedule;
use astreinte_core::schema::format_date;
use astreinte_core::slots::Slot;
use astreinte_core::summary::PersonSummary;
use std::fs;
use std::path::{Path, PathBuf};
use time::Date;
use time::macros::format_description;

pub struct ReportPaths {
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub schedules_dir: PathBuf,
    pub conflicts_dir: PathBuf,
}

impl ReportPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            index_dir: root.join("00_Index"),
            schedules_dir: root.join("Schedules"),
            conflicts_dir: root.join("Conflicts"),
            root,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.index_dir)?;
        fs::create_dir_all(&self.schedules_dir)?;
        fs::create_dir_all(&self.conflicts_dir)?;
        Ok(())
    }
}

/// Writes the schedule, conflict and hours notes for one period and
/// regenerates the index. Returns the schedule note path.
pub fn build_report(
    root: &Path,
    schedule: &Schedule,
    conflicts: &[Conflict],
    hours: &[PersonSummary],
) -> Result<PathBuf> {
    let paths = ReportPaths::new(root);
    paths.ensure()?;

    let Some(first_day) = schedule.days.first().map(|day| day.date) else {
        anyhow::bail!("Cannot build a report for an empty schedule");
    };
    let period = period_name(first_day)?;

    // 1) Schedule note
    let schedule_path = paths.schedules_dir.join(format!("{period}.md"));
    fs::write(&schedule_path, render_schedule(&period, schedule))?;

    // 2) Conflicts note
    let conflicts_path = paths.conflicts_dir.join(format!("{period}.md"));
    fs::write(&conflicts_path, render_conflicts(&period, conflicts))?;

    // 3) Hours note, always reflecting the full history
    fs::write(paths.root.join("Hours.md"), render_hours(hours))?;

    // 4) Index of every period written so far
    let mut index_lines: Vec<String> = Vec::new();
    index_lines.push("# MOC - Plannings".to_string());
    index_lines.push(String::new());
    index_lines.push("This index is generated. Do not edit manually.".to_string());
    index_lines.push(String::new());
    index_lines.push("- [[Hours|Hours per person]]".to_string());
    index_lines.push(String::new());
    index_lines.push("## Schedules".to_string());
    index_lines.push(String::new());

    let mut periods = list_notes(&paths.schedules_dir)?;
    periods.sort();
    if periods.is_empty() {
        index_lines.push("_No schedules found._".to_string());
    } else {
        for stem in periods {
            index_lines.push(format!(
                "- [[Schedules/{stem}|{stem}]] ([[Conflicts/{stem}|conflicts]])"
            ));
        }
    }

    fs::write(paths.index_dir.join("MOC - Plannings.md"), index_lines.join("\n"))?;

    tracing::info!(path = %schedule_path.display(), conflicts = conflicts.len(), "report written");
    Ok(schedule_path)
}

fn period_name(day: Date) -> Result<String> {
    Ok(day.format(format_description!("[year]-[month]"))?)
}

fn list_notes(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let stems = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
                return None;
            }
            Some(path.file_stem()?.to_str()?.to_string())
        })
        .collect();
    Ok(stems)
}

fn table_header(md: &mut String, columns: &[&str]) {
    md.push_str(&format!("| {} |\n", columns.join(" | ")));
    md.push_str(&format!("|{}\n", "---|".repeat(columns.len())));
}

fn render_schedule(period: &str, schedule: &Schedule) -> String {
    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("period: {period}\n"));
    md.push_str(&format!("policy: {:?}\n", schedule.policy));
    md.push_str("---\n\n");
    md.push_str(&format!("# Final schedule {period}\n\n"));

    let mut columns = vec!["Date", "Jour"];
    columns.extend(Slot::ALL.iter().map(|slot| slot.label()));
    table_header(&mut md, &columns);

    for day in &schedule.days {
        let mut cells = vec![format_date(day.date), day.weekday.clone()];
        cells.extend(day.cells.iter().map(|cell| cell.dual.to_string()));
        md.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    md.push_str("\n## Single cover\n\n");
    table_header(&mut md, &columns);
    for day in &schedule.days {
        let mut cells = vec![format_date(day.date), day.weekday.clone()];
        cells.extend(day.cells.iter().map(|cell| cell.cover.to_string()));
        md.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    md
}

fn render_conflicts(period: &str, conflicts: &[Conflict]) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Conflicts {period}\n\n"));
    if conflicts.is_empty() {
        md.push_str("_No conflict detected for this period._\n");
        return md;
    }
    table_header(&mut md, &["Date", "Plage", "Role", "Users"]);
    for conflict in conflicts {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            format_date(conflict.date),
            conflict.slot,
            conflict.tier,
            conflict.people.join(", ")
        ));
    }
    md
}

fn render_hours(hours: &[PersonSummary]) -> String {
    let mut md = String::new();
    md.push_str("# Hours per person\n\n");
    if hours.is_empty() {
        md.push_str("_No declared hours._\n");
        return md;
    }
    table_header(
        &mut md,
        &["Utilisateur", "Day (07h-19h)", "Night (19h-07h)", "N1", "N2", "Total"],
    );
    for summary in hours {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            summary.person,
            summary.day_hours,
            summary.night_hours,
            summary.n1_hours,
            summary.n2_hours,
            summary.total()
        ));
    }
    md
}
