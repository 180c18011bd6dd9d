use crate::Database;
use crate::models::{AttendanceRow, MemberRow, OccurrenceRow};
use anyhow::Result;

impl Database {
    // -- Members --

    /// Insert a member, or refresh the display name of an existing one.
    /// The ignored flag is locally owned state and is never touched here.
    pub fn upsert_member(&self, id: &str, display_name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO members (id, display_name) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name",
                (id, display_name),
            )?;
            Ok(())
        })
    }

    /// Remove a member; their attendance rows go with them (ON DELETE CASCADE).
    pub fn delete_member(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM members WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Returns false when no such member exists.
    pub fn set_ignored(&self, id: &str, ignored: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE members SET ignored = ?2 WHERE id = ?1",
                (id, ignored),
            )?;
            Ok(n > 0)
        })
    }

    pub fn get_member(&self, id: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, display_name, ignored FROM members WHERE id = ?1",
                    [id],
                    member_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Display names are not unique; the caller decides what multiple
    /// matches mean.
    pub fn members_by_name(&self, display_name: &str) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, display_name, ignored FROM members
                 WHERE display_name = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([display_name], member_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_members(&self) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, display_name, ignored FROM members ORDER BY id")?;
            let rows = stmt
                .query_map([], member_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Occurrences --

    /// Insert-if-absent: a duplicate trigger for an already-recorded post or
    /// date is a no-op. Returns true when a row was actually inserted.
    pub fn insert_occurrence(
        &self,
        post_id: &str,
        event_date: &str,
        channel_id: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO occurrences (post_id, event_date, channel_id)
                 VALUES (?1, ?2, ?3)",
                (post_id, event_date, channel_id),
            )?;
            Ok(n > 0)
        })
    }

    /// Most recent occurrence. Post ids are monotonically increasing
    /// transport tokens, so text ordering is recency ordering.
    pub fn latest_occurrence(&self) -> Result<Option<OccurrenceRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT post_id, event_date, channel_id FROM occurrences
                     ORDER BY post_id DESC LIMIT 1",
                    [],
                    occurrence_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn occurrence_by_date(&self, event_date: &str) -> Result<Option<OccurrenceRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT post_id, event_date, channel_id FROM occurrences
                     WHERE event_date = ?1",
                    [event_date],
                    occurrence_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Attendance --

    /// Expand the attendance table for an occurrence: one row per non-ignored
    /// member, initial state unknown. Insert-if-absent, so re-running never
    /// clobbers an already-merged cell. Returns the number of new rows.
    pub fn expand_attendance(&self, post_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO attendance (member_id, post_id)
                 SELECT id, ?1 FROM members WHERE ignored = 0",
                [post_id],
            )?;
            Ok(n)
        })
    }

    /// Keyed update of one attendance cell. Returns true only when the stored
    /// value actually changed, so idempotent re-runs report zero changes.
    /// A (member, post) pair with no row is left alone — rows are only ever
    /// created by expansion.
    pub fn mark_presence(&self, member_id: &str, post_id: &str, present: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE attendance SET present = ?3
                 WHERE member_id = ?1 AND post_id = ?2
                   AND (present IS NULL OR present != ?3)",
                (member_id, post_id, present),
            )?;
            Ok(n > 0)
        })
    }

    pub fn attendance_exists(&self, member_id: &str, post_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let row: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM attendance WHERE member_id = ?1 AND post_id = ?2",
                    (member_id, post_id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(row.is_some())
        })
    }

    pub fn attendance_for_occurrence(&self, post_id: &str) -> Result<Vec<AttendanceRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT member_id, post_id, present FROM attendance
                 WHERE post_id = ?1 ORDER BY member_id",
            )?;
            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(AttendanceRow {
                        member_id: row.get(0)?,
                        post_id: row.get(1)?,
                        present: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Display names of members with an attendance row in every one of the
    /// most recent `window` occurrences and no observed reaction in any of
    /// them. Members whose history is shorter than the window never qualify,
    /// and neither does anyone while fewer than `window` occurrences exist.
    pub fn absent_streak_names(&self, window: u32) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT display_name FROM (
                     SELECT m.display_name AS display_name
                     FROM members m
                     JOIN attendance a ON a.member_id = m.id
                     JOIN (SELECT post_id FROM occurrences
                           ORDER BY post_id DESC LIMIT ?1) recent
                       ON recent.post_id = a.post_id
                     GROUP BY m.id
                     HAVING COUNT(*) = ?1 AND COUNT(a.present) = 0
                 )
                 ORDER BY display_name",
            )?;
            let rows = stmt
                .query_map([window], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn member_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        id: row.get(0)?,
        display_name: row.get(1)?,
        ignored: row.get(2)?,
    })
}

fn occurrence_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OccurrenceRow> {
    Ok(OccurrenceRow {
        post_id: row.get(0)?,
        event_date: row.get(1)?,
        channel_id: row.get(2)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_upsert_preserves_ignored_flag() {
        let db = db();
        db.upsert_member("U1", "Ada").unwrap();
        db.set_ignored("U1", true).unwrap();

        // A later sync refreshes the name but must not reset the flag.
        db.upsert_member("U1", "Ada L.").unwrap();
        let m = db.get_member("U1").unwrap().unwrap();
        assert_eq!(m.display_name, "Ada L.");
        assert!(m.ignored);
    }

    #[test]
    fn test_set_ignored_unknown_member() {
        let db = db();
        assert!(!db.set_ignored("nope", true).unwrap());
    }

    #[test]
    fn test_insert_occurrence_is_insert_if_absent() {
        let db = db();
        assert!(db.insert_occurrence("1700000000", "14/11/23", "C1").unwrap());
        assert!(!db.insert_occurrence("1700000000", "14/11/23", "C1").unwrap());
    }

    #[test]
    fn test_latest_occurrence_orders_by_post_id() {
        let db = db();
        db.insert_occurrence("1700000000", "14/11/23", "C1").unwrap();
        db.insert_occurrence("1700604800", "21/11/23", "C1").unwrap();
        db.insert_occurrence("1700086400", "15/11/23", "C1").unwrap();

        let latest = db.latest_occurrence().unwrap().unwrap();
        assert_eq!(latest.post_id, "1700604800");
    }

    #[test]
    fn test_expand_skips_ignored_members() {
        let db = db();
        db.upsert_member("U1", "Ada").unwrap();
        db.upsert_member("U2", "Bob").unwrap();
        db.set_ignored("U2", true).unwrap();
        db.insert_occurrence("1700000000", "14/11/23", "C1").unwrap();

        assert_eq!(db.expand_attendance("1700000000").unwrap(), 1);
        let rows = db.attendance_for_occurrence("1700000000").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member_id, "U1");
        assert_eq!(rows[0].present, None);
    }

    #[test]
    fn test_mark_presence_reports_change_only() {
        let db = db();
        db.upsert_member("U1", "Ada").unwrap();
        db.insert_occurrence("1700000000", "14/11/23", "C1").unwrap();
        db.expand_attendance("1700000000").unwrap();

        assert!(db.mark_presence("U1", "1700000000", true).unwrap());
        // Same value again: no-op.
        assert!(!db.mark_presence("U1", "1700000000", true).unwrap());
        // Flip: counts as a change.
        assert!(db.mark_presence("U1", "1700000000", false).unwrap());
        // No row for this pair: nothing to update.
        assert!(!db.mark_presence("U9", "1700000000", true).unwrap());
    }

    #[test]
    fn test_delete_member_cascades_to_attendance() {
        let db = db();
        db.upsert_member("U1", "Ada").unwrap();
        db.insert_occurrence("1700000000", "14/11/23", "C1").unwrap();
        db.expand_attendance("1700000000").unwrap();
        assert!(db.attendance_exists("U1", "1700000000").unwrap());

        db.delete_member("U1").unwrap();
        assert!(!db.attendance_exists("U1", "1700000000").unwrap());
    }

    #[test]
    fn test_absent_streak_requires_full_window() {
        let db = db();
        db.upsert_member("U1", "Ada").unwrap(); // never reacts
        db.upsert_member("U2", "Bob").unwrap(); // reacts once
        for (ts, date) in [
            ("1700000000", "14/11/23"),
            ("1700604800", "21/11/23"),
            ("1701209600", "28/11/23"),
            ("1701814400", "05/12/23"),
        ] {
            db.insert_occurrence(ts, date, "C1").unwrap();
            db.expand_attendance(ts).unwrap();
        }
        db.mark_presence("U2", "1701209600", true).unwrap();

        // A member who joined after the window started has fewer rows.
        db.upsert_member("U3", "Eve").unwrap();
        db.insert_occurrence("1702419200", "12/12/23", "C1").unwrap();
        db.expand_attendance("1702419200").unwrap();

        let names = db.absent_streak_names(4).unwrap();
        assert_eq!(names, vec!["Ada".to_string()]);
    }

    #[test]
    fn test_absent_streak_empty_with_short_history() {
        let db = db();
        db.upsert_member("U1", "Ada").unwrap();
        db.insert_occurrence("1700000000", "14/11/23", "C1").unwrap();
        db.expand_attendance("1700000000").unwrap();

        assert!(db.absent_streak_names(4).unwrap().is_empty());
    }
}
