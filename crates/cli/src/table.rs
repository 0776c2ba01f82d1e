use astreinte_core::conflicts::Conflict;
use astreinte_core::engine::Schedule;
use astreinte_core::schema::{DayPlan, SlotLabels, StandardTemplate, format_date};
use astreinte_core::slots::Slot;
use astreinte_core::summary::PersonSummary;
use time::Date;

pub fn date(day: Date) -> String {
    format_date(day)
}

/// Left-aligned columns sized to their widest cell.
fn render(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(header);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(&line(rule.as_slice()));
    for row in rows {
        out.push_str(&line(row.as_slice()));
    }
    out
}

fn slot_header(leading: &[&str]) -> Vec<String> {
    leading
        .iter()
        .map(|cell| cell.to_string())
        .chain(Slot::ALL.iter().map(|slot| slot.label().to_string()))
        .collect()
}

fn label_cells(labels: &SlotLabels) -> impl Iterator<Item = String> + '_ {
    labels
        .iter()
        .map(|(_, label)| label.map(|tier| tier.to_string()).unwrap_or_default())
}

pub fn plans(rows: &[DayPlan]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            [format_date(row.date), row.weekday_name()]
                .into_iter()
                .chain(label_cells(&row.labels))
                .collect()
        })
        .collect();
    render(&slot_header(&["Date", "Jour"]), &body)
}

pub fn template(template: &StandardTemplate) -> String {
    let body: Vec<Vec<String>> = vec![
        std::iter::once(template.person.clone())
            .chain(label_cells(&template.labels))
            .collect(),
    ];
    render(&slot_header(&["Utilisateur"]), &body)
}

pub fn schedule(schedule: &Schedule, fallback: bool) -> String {
    let body: Vec<Vec<String>> = schedule
        .days
        .iter()
        .map(|day| {
            [format_date(day.date), day.weekday.clone()]
                .into_iter()
                .chain(day.cells.iter().map(|cell| {
                    if fallback {
                        cell.cover.to_string()
                    } else {
                        cell.dual.to_string()
                    }
                }))
                .collect()
        })
        .collect();
    render(&slot_header(&["Date", "Jour"]), &body)
}

pub fn conflicts(conflicts: &[Conflict]) -> String {
    let header: Vec<String> = ["Date", "Plage", "Role", "Users"]
        .iter()
        .map(|cell| cell.to_string())
        .collect();
    let body: Vec<Vec<String>> = conflicts
        .iter()
        .map(|conflict| {
            vec![
                format_date(conflict.date),
                conflict.slot.to_string(),
                conflict.tier.to_string(),
                conflict.people.join(", "),
            ]
        })
        .collect();
    render(&header, &body)
}

pub fn hours(summary: &[PersonSummary]) -> String {
    let header: Vec<String> = ["Utilisateur", "Day", "Night", "N1", "N2", "Total"]
        .iter()
        .map(|cell| cell.to_string())
        .collect();
    let body: Vec<Vec<String>> = summary
        .iter()
        .map(|person| {
            vec![
                person.person.clone(),
                person.day_hours.to_string(),
                person.night_hours.to_string(),
                person.n1_hours.to_string(),
                person.n2_hours.to_string(),
                person.total().to_string(),
            ]
        })
        .collect();
    render(&header, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_on_widest_cell() {
        let header = vec!["A".to_string(), "B".to_string()];
        let rows = vec![vec!["long cell".to_string(), "x".to_string()]];
        let out = render(&header, &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "A          B");
        assert_eq!(lines[1], "---------  -");
        assert_eq!(lines[2], "long cell  x");
    }
}
