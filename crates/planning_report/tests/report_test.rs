use astreinte_core::conflicts::find_conflicts;
use astreinte_core::engine::{BalancingPolicy, build_schedule};
use astreinte_core::schema::{DayPlan, SlotLabels, flatten, parse_month};
use astreinte_core::summary::summarize;
use astreinte_core::{Priority, Slot};
use planning_report::build_report;
use std::fs;
use time::macros::date;

#[test]
fn report_writes_schedule_conflicts_hours_and_index() {
    let dir = tempfile::tempdir().unwrap();
    let plans = vec![
        DayPlan::new(
            date!(2024 - 03 - 04),
            "Alice",
            SlotLabels::default().with(Slot::EarlyMorning, Priority::N1),
        ),
        DayPlan::new(
            date!(2024 - 03 - 04),
            "Bob",
            SlotLabels::default().with(Slot::EarlyMorning, Priority::N1),
        ),
    ];
    let history = flatten(&plans);
    let march = parse_month("2024-03").unwrap();
    let schedule = build_schedule(&history, march, BalancingPolicy::Snapshot);
    let conflicts = find_conflicts(&history);

    let schedule_path = build_report(dir.path(), &schedule, &conflicts, &summarize(&history)).unwrap();

    assert_eq!(schedule_path, dir.path().join("Schedules").join("2024-03.md"));
    let schedule_note = fs::read_to_string(&schedule_path).unwrap();
    assert!(schedule_note.contains("| 2024-03-31 | Sunday |"));
    assert!(schedule_note.contains("N1 Alice"));

    let conflict_note = fs::read_to_string(dir.path().join("Conflicts").join("2024-03.md")).unwrap();
    assert!(conflict_note.contains("Alice, Bob"));

    let hours_note = fs::read_to_string(dir.path().join("Hours.md")).unwrap();
    assert!(hours_note.contains("| Alice | 2 | 0 | 2 | 0 | 2 |"));

    let index = fs::read_to_string(dir.path().join("00_Index").join("MOC - Plannings.md")).unwrap();
    assert!(index.contains("[[Schedules/2024-03|2024-03]]"));
}
