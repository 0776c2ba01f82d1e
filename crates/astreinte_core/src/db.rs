use crate::error::RepositoryError;
use crate::repository::ScheduleRepository;
use crate::schema::{DayPlan, SlotLabels, StandardTemplate, format_date, parse_date};
use crate::slots::Slot;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::BTreeSet;
use std::path::Path;
use time::Date;

const PLANNINGS: &str = "plannings";
const STANDARDS: &str = "standard_plannings";

/// Planning rows and templates stored in SQLite, one column per slot.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    pub fn open(db_path: &Path) -> Result<Self, RepositoryError> {
        if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| RepositoryError::Unavailable(format!("{}: {err}", parent.display())))?;
        }
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        init(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn slot_columns_ddl() -> String {
    Slot::ALL
        .iter()
        .map(|slot| format!("  \"{}\" TEXT NOT NULL DEFAULT ''", slot.label()))
        .collect::<Vec<_>>()
        .join(",\n")
}

fn init(conn: &Connection) -> Result<(), RepositoryError> {
    let slots = slot_columns_ddl();
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {PLANNINGS} (
          "Date" TEXT NOT NULL,
          "Jour" TEXT NOT NULL DEFAULT '',
          "Utilisateur" TEXT NOT NULL,
        {slots},
          inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_plannings_user_date ON {PLANNINGS}("Utilisateur", "Date");

        CREATE TABLE IF NOT EXISTS {STANDARDS} (
          "Utilisateur" TEXT PRIMARY KEY,
        {slots}
        );
        "#
    ))?;

    // Tables written before a slot existed (e.g. with `12h-14h` only).
    for table in [PLANNINGS, STANDARDS] {
        let existing = table_columns(conn, table)?;
        for slot in Slot::ALL {
            if !existing.contains(slot.label()) {
                tracing::info!(table, column = slot.label(), "adding missing slot column");
                conn.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN \"{}\" TEXT NOT NULL DEFAULT ''",
                    slot.label()
                ))?;
            }
        }
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>, RepositoryError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(names)
}

fn quoted_slot_list() -> String {
    Slot::ALL
        .iter()
        .map(|slot| format!("\"{}\"", slot.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads every slot-like column by name so legacy or missing columns
/// degrade to empty cells.
fn read_labels(row: &Row<'_>, columns: &[String]) -> SlotLabels {
    SlotLabels::from_columns(columns.iter().enumerate().map(|(index, column)| {
        let cell = row
            .get_ref(index)
            .ok()
            .and_then(|value| value.as_str().ok());
        (column.as_str(), cell)
    }))
}

fn read_text(row: &Row<'_>, columns: &[String], name: &str) -> Option<String> {
    let index = columns.iter().position(|column| column == name)?;
    row.get_ref(index)
        .ok()
        .and_then(|value| value.as_str().ok())
        .map(|value| value.trim().to_string())
}

impl ScheduleRepository for SqliteRepository {
    fn load_all(&self) -> Result<Vec<DayPlan>, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {PLANNINGS} ORDER BY rowid"))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let rows = stmt.query_map([], |row| {
            let date = read_text(row, &columns, "Date");
            let person = read_text(row, &columns, "Utilisateur").unwrap_or_default();
            Ok((date, person, read_labels(row, &columns)))
        })?;

        let mut plans = Vec::new();
        for r in rows {
            let (raw_date, person, labels) = r?;
            let Some(date) = raw_date.as_deref().and_then(|raw| parse_date(raw).ok()) else {
                tracing::warn!(?raw_date, %person, "skipping planning row without a valid date");
                continue;
            };
            plans.push(DayPlan::new(date, person, labels));
        }
        Ok(plans)
    }

    fn save_for_person(&mut self, person: &str, rows: &[DayPlan]) -> Result<(), RepositoryError> {
        let dates: BTreeSet<Date> = rows.iter().map(|row| row.date).collect();
        let slot_list = quoted_slot_list();
        let placeholders = (1..=3 + Slot::ALL.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        for date in &dates {
            tx.execute(
                &format!(r#"DELETE FROM {PLANNINGS} WHERE TRIM("Utilisateur") = ?1 AND substr("Date", 1, 10) = ?2"#),
                params![person, format_date(*date)],
            )?;
        }
        {
            let mut insert = tx.prepare(&format!(
                r#"INSERT INTO {PLANNINGS} ("Date", "Jour", "Utilisateur", {slot_list}) VALUES ({placeholders})"#
            ))?;
            for row in rows {
                let mut values = vec![format_date(row.date), row.weekday_name(), row.person.clone()];
                values.extend(
                    row.labels
                        .iter()
                        .map(|(_, label)| label.map(|tier| tier.as_str()).unwrap_or_default().to_string()),
                );
                insert.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_standards(&self) -> Result<Vec<StandardTemplate>, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {STANDARDS} ORDER BY rowid"))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let rows = stmt.query_map([], |row| {
            let person = read_text(row, &columns, "Utilisateur").unwrap_or_default();
            Ok(StandardTemplate::new(person, read_labels(row, &columns)))
        })?;
        let templates = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(templates)
    }

    fn load_standard(&self, person: &str) -> Result<Option<StandardTemplate>, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!(r#"SELECT * FROM {STANDARDS} WHERE "Utilisateur" = ?1"#))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let template = stmt
            .query_row(params![person], |row| {
                Ok(StandardTemplate::new(person, read_labels(row, &columns)))
            })
            .optional()?;
        Ok(template)
    }

    fn save_standard(&mut self, template: &StandardTemplate) -> Result<(), RepositoryError> {
        let slot_list = quoted_slot_list();
        let placeholders = (1..=1 + Slot::ALL.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let updates = Slot::ALL
            .iter()
            .map(|slot| format!("\"{0}\"=excluded.\"{0}\"", slot.label()))
            .collect::<Vec<_>>()
            .join(",\n          ");

        let mut values = vec![template.person.clone()];
        values.extend(
            template
                .labels
                .iter()
                .map(|(_, label)| label.map(|tier| tier.as_str()).unwrap_or_default().to_string()),
        );

        self.conn.execute(
            &format!(
                r#"
        INSERT INTO {STANDARDS} ("Utilisateur", {slot_list})
        VALUES ({placeholders})
        ON CONFLICT("Utilisateur") DO UPDATE SET
          {updates}
        "#
            ),
            params_from_iter(values),
        )?;
        Ok(())
    }
}
