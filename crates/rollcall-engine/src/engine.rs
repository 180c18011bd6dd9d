use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use rollcall_db::Database;
use rollcall_types::{
    AttendanceRecord, Member, MemberInfo, Occurrence, Presence, TransportError,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::transport::ChatTransport;

/// Wire format of event dates, inherited from the announcement text.
pub const DATE_FORMAT: &str = "%d/%m/%y";

/// Result of a reconciliation run. `NothingToReconcile` is a defined empty
/// result, not a failure: no occurrence has been published yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    NothingToReconcile,
    Reconciled {
        newly_present: usize,
        newly_absent: usize,
    },
}

/// One occurrence together with its attendance cells, for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSheet {
    pub occurrence: Occurrence,
    pub records: Vec<AttendanceRecord>,
}

/// The orchestrator. Holds its collaborators explicitly — no process-wide
/// client or session objects.
pub struct Engine {
    db: Arc<Database>,
    transport: Arc<dyn ChatTransport>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(db: Arc<Database>, transport: Arc<dyn ChatTransport>, config: EngineConfig) -> Self {
        Self {
            db,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -- Roster synchronization --

    /// Refresh the roster from the membership directory: upsert every live
    /// entry (display name only — the ignore flag is locally owned), delete
    /// every tombstoned one (attendance rows cascade). Idempotent; a failed
    /// fetch leaves the store untouched, and a partial write converges on
    /// the next run.
    pub fn sync(&self) -> Result<(), EngineError> {
        let entries = self
            .transport
            .list_members()
            .map_err(EngineError::DirectoryFetch)?;

        let mut upserted = 0usize;
        let mut removed = 0usize;
        for entry in &entries {
            if entry.deleted {
                self.db.delete_member(&entry.id)?;
                removed += 1;
            } else {
                self.db.upsert_member(&entry.id, &entry.display_name)?;
                upserted += 1;
            }
        }

        info!(upserted, removed, "roster synchronized");
        Ok(())
    }

    // -- Occurrence publishing --

    /// Post the recurring prompt and record the occurrence. The event date
    /// is taken from `event_date` when given, otherwise derived from the
    /// transport-assigned post id (an epoch-seconds token). The store insert
    /// is insert-if-absent, so a duplicate trigger does not corrupt the
    /// occurrence table — only the duplicate message itself is visible.
    pub fn publish(&self, event_date: Option<NaiveDate>) -> Result<String, EngineError> {
        let posted = self
            .transport
            .post_message(&self.config.channel, &self.config.prompt_text)?;

        // Seed both reactions on the prompt so members only have to click.
        for kind in [&self.config.present_reaction, &self.config.absent_reaction] {
            if let Err(err) = self
                .transport
                .add_reaction(&posted.channel_id, &posted.post_id, kind)
            {
                warn!(%err, reaction = %kind, "could not seed reaction on prompt");
            }
        }

        let date = match event_date {
            Some(d) => d.format(DATE_FORMAT).to_string(),
            None => event_date_from_post_id(&posted.post_id)?,
        };

        let inserted = self
            .db
            .insert_occurrence(&posted.post_id, &date, &posted.channel_id)?;
        info!(post_id = %posted.post_id, %date, inserted, "occurrence published");

        Ok(posted.post_id)
    }

    // -- Reconciliation --

    /// Reconcile the latest occurrence against the current reaction
    /// snapshot. Safe to re-invoke: expansion is insert-if-absent and the
    /// merge only touches cells whose value actually changes, so a second
    /// run over the same snapshot reports zero newly-marked members.
    pub fn reconcile(&self) -> Result<ReconcileOutcome, EngineError> {
        self.sync()?;

        let Some(occurrence) = self.db.latest_occurrence()? else {
            return Ok(ReconcileOutcome::NothingToReconcile);
        };

        let expanded = self.db.expand_attendance(&occurrence.post_id)?;
        if expanded > 0 {
            info!(
                post_id = %occurrence.post_id,
                rows = expanded,
                "attendance expanded"
            );
        }

        // Fetch before writing; no lock is held across the transport call.
        let groups = self
            .transport
            .get_reactions(&occurrence.channel_id, &occurrence.post_id)?;

        // Present first, then absent: a member who reacted with both ends up
        // absent. A defined tie-break, arbitrary by construction.
        let newly_present =
            self.apply_reaction(&groups, &self.config.present_reaction, &occurrence.post_id, true)?;
        let newly_absent =
            self.apply_reaction(&groups, &self.config.absent_reaction, &occurrence.post_id, false)?;

        info!(
            post_id = %occurrence.post_id,
            newly_present,
            newly_absent,
            "reconciliation complete"
        );
        Ok(ReconcileOutcome::Reconciled {
            newly_present,
            newly_absent,
        })
    }

    /// Mark everyone under `reaction_kind` with `present`, counting only
    /// cells whose stored value changed. Ids without an attendance row
    /// (non-members, members added after expansion) fall through silently —
    /// rows are only ever created by expansion.
    fn apply_reaction(
        &self,
        groups: &[rollcall_types::ReactionGroup],
        reaction_kind: &str,
        post_id: &str,
        present: bool,
    ) -> Result<usize, EngineError> {
        let mut changed = 0usize;
        for group in groups.iter().filter(|g| g.reaction_kind == reaction_kind) {
            for member_id in &group.member_ids {
                if self.db.mark_presence(member_id, post_id, present)? {
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    // -- Absence reporting --

    /// Display names of members with no observed reaction in each of the
    /// most recent `window` occurrences (default from config). Members with
    /// a shorter history than the window never qualify.
    pub fn absent_streak(&self, window: Option<u32>) -> Result<Vec<String>, EngineError> {
        let window = window.unwrap_or(self.config.report_window);
        Ok(self.db.absent_streak_names(window)?)
    }

    // -- Member management --

    /// Toggle a member's ignore flag. Takes effect at the next expansion;
    /// existing attendance rows are untouched.
    pub fn set_ignore(&self, member_id: &str, ignored: bool) -> Result<(), EngineError> {
        if !self.db.set_ignored(member_id, ignored)? {
            return Err(EngineError::MemberNotFound(member_id.to_string()));
        }
        info!(member_id, ignored, "ignore flag updated");
        Ok(())
    }

    /// Resolve a display name to a member id. Display names are not unique:
    /// zero matches and multiple matches both fail closed.
    pub fn resolve_member(&self, display_name: &str) -> Result<String, EngineError> {
        let mut matches = self.db.members_by_name(display_name)?;
        match matches.len() {
            0 => Err(EngineError::MemberNotFound(display_name.to_string())),
            1 => Ok(matches.remove(0).id),
            _ => Err(EngineError::AmbiguousName(display_name.to_string())),
        }
    }

    /// Manual attendance override ("/here Ada Lovelace, 14/11/23"). Only
    /// updates a row that expansion already created; it never fabricates
    /// attendance for a member who was not part of that occurrence.
    pub fn record_attendance(
        &self,
        display_name: &str,
        event_date: NaiveDate,
        present: bool,
    ) -> Result<(), EngineError> {
        let member_id = self.resolve_member(display_name)?;
        let date = event_date.format(DATE_FORMAT).to_string();

        let Some(occurrence) = self.db.occurrence_by_date(&date)? else {
            return Err(EngineError::OccurrenceNotFound(date));
        };

        if !self.db.attendance_exists(&member_id, &occurrence.post_id)? {
            return Err(EngineError::AttendanceNotRecorded {
                name: display_name.to_string(),
                date,
            });
        }

        self.db
            .mark_presence(&member_id, &occurrence.post_id, present)?;
        info!(member_id, %date, present, "attendance recorded manually");
        Ok(())
    }

    /// Profile lookup, passed through to the transport.
    pub fn member_info(&self, member_id: &str) -> Result<MemberInfo, EngineError> {
        Ok(self.transport.get_member_info(member_id)?)
    }

    // -- Inspection --

    /// Current roster, ignore flags included.
    pub fn roster(&self) -> Result<Vec<Member>, EngineError> {
        Ok(self
            .db
            .list_members()?
            .into_iter()
            .map(|m| Member {
                id: m.id,
                display_name: m.display_name,
                ignored: m.ignored,
            })
            .collect())
    }

    /// Attendance cells for one occurrence: the one on `event_date`, or the
    /// latest when no date is given. None when nothing matches.
    pub fn attendance(
        &self,
        event_date: Option<NaiveDate>,
    ) -> Result<Option<AttendanceSheet>, EngineError> {
        let occurrence = match event_date {
            Some(d) => {
                let date = d.format(DATE_FORMAT).to_string();
                self.db.occurrence_by_date(&date)?
            }
            None => self.db.latest_occurrence()?,
        };
        let Some(occurrence) = occurrence else {
            return Ok(None);
        };

        let records = self
            .db
            .attendance_for_occurrence(&occurrence.post_id)?
            .into_iter()
            .map(|r| AttendanceRecord {
                member_id: r.member_id,
                post_id: r.post_id,
                present: Presence::from_sql(r.present),
            })
            .collect();

        Ok(Some(AttendanceSheet {
            occurrence: Occurrence {
                post_id: occurrence.post_id,
                event_date: occurrence.event_date,
                channel_id: occurrence.channel_id,
            },
            records,
        }))
    }
}

/// Post ids are epoch-seconds issuance tokens ("1477581478.000200"); the
/// event date falls out of the integral part.
fn event_date_from_post_id(post_id: &str) -> Result<String, EngineError> {
    let seconds: i64 = post_id
        .split('.')
        .next()
        .unwrap_or(post_id)
        .parse()
        .map_err(|_| {
            EngineError::Transport(TransportError::MalformedResponse(format!(
                "post id is not a timestamp token: {post_id}"
            )))
        })?;
    let ts = chrono::DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        EngineError::Transport(TransportError::MalformedResponse(format!(
            "post id timestamp out of range: {post_id}"
        )))
    })?;
    Ok(ts.format(DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use rollcall_types::{DirectoryEntry, PostedMessage, ReactionGroup};

    /// Canned transport. Posting hands out sequential epoch-second post ids
    /// like the real service does.
    struct MockTransport {
        directory: Mutex<Vec<DirectoryEntry>>,
        reactions: Mutex<Vec<ReactionGroup>>,
        next_post_ts: Mutex<i64>,
        seeded: Mutex<Vec<String>>,
        fail_directory: Mutex<bool>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                directory: Mutex::new(Vec::new()),
                reactions: Mutex::new(Vec::new()),
                next_post_ts: Mutex::new(1_700_000_000),
                seeded: Mutex::new(Vec::new()),
                fail_directory: Mutex::new(false),
            }
        }

        fn set_directory(&self, entries: &[(&str, &str, bool)]) {
            *self.directory.lock().unwrap() = entries
                .iter()
                .map(|(id, name, deleted)| DirectoryEntry {
                    id: id.to_string(),
                    display_name: name.to_string(),
                    deleted: *deleted,
                })
                .collect();
        }

        fn set_reactions(&self, groups: &[(&str, &[&str])]) {
            *self.reactions.lock().unwrap() = groups
                .iter()
                .map(|(kind, ids)| ReactionGroup {
                    reaction_kind: kind.to_string(),
                    member_ids: ids.iter().map(|s| s.to_string()).collect(),
                })
                .collect();
        }
    }

    impl ChatTransport for MockTransport {
        fn post_message(
            &self,
            channel: &str,
            _text: &str,
        ) -> Result<PostedMessage, TransportError> {
            let mut ts = self.next_post_ts.lock().unwrap();
            *ts += 604_800; // one week apart
            Ok(PostedMessage {
                post_id: format!("{}.000100", *ts),
                channel_id: channel.to_string(),
            })
        }

        fn add_reaction(
            &self,
            _channel: &str,
            _post_id: &str,
            reaction_kind: &str,
        ) -> Result<(), TransportError> {
            self.seeded.lock().unwrap().push(reaction_kind.to_string());
            Ok(())
        }

        fn get_reactions(
            &self,
            _channel: &str,
            _post_id: &str,
        ) -> Result<Vec<ReactionGroup>, TransportError> {
            Ok(self.reactions.lock().unwrap().clone())
        }

        fn list_members(&self) -> Result<Vec<DirectoryEntry>, TransportError> {
            if *self.fail_directory.lock().unwrap() {
                return Err(TransportError::Http("connection reset".into()));
            }
            Ok(self.directory.lock().unwrap().clone())
        }

        fn get_member_info(&self, id: &str) -> Result<MemberInfo, TransportError> {
            let dir = self.directory.lock().unwrap();
            dir.iter()
                .find(|e| e.id == id && !e.deleted)
                .map(|e| MemberInfo {
                    display_name: e.display_name.clone(),
                    is_admin: false,
                })
                .ok_or_else(|| TransportError::Api {
                    code: "user_not_found".into(),
                })
        }
    }

    fn engine() -> (Engine, Arc<MockTransport>, Arc<Database>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let transport = Arc::new(MockTransport::new());
        let engine = Engine::new(db.clone(), transport.clone(), EngineConfig::default());
        (engine, transport, db)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_sync_upserts_and_deletes() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[
            ("U1", "Ada", false),
            ("U2", "Bob", false),
            ("U3", "Gone", true),
        ]);
        engine.sync().unwrap();

        let members = db.list_members().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].id, "U1");
        assert_eq!(members[1].id, "U2");
    }

    #[test]
    fn test_sync_failure_leaves_store_unchanged() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[("U1", "Ada", false)]);
        engine.sync().unwrap();

        *transport.fail_directory.lock().unwrap() = true;
        let err = engine.sync().unwrap_err();
        assert!(matches!(err, EngineError::DirectoryFetch(_)));
        assert_eq!(db.list_members().unwrap().len(), 1);
    }

    #[test]
    fn test_sync_converges_after_partial_write() {
        let (engine, transport, db) = engine();
        // A prior run got through only part of the batch.
        db.upsert_member("U1", "Ada").unwrap();

        transport.set_directory(&[
            ("U1", "Ada", false),
            ("U2", "Bob", false),
            ("U3", "Eve", true),
        ]);
        engine.sync().unwrap();
        engine.sync().unwrap(); // idempotent

        let members = db.list_members().unwrap();
        let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["U1", "U2"]);
    }

    #[test]
    fn test_sync_deletion_cascades_to_attendance() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[("U1", "Ada", false)]);
        engine.sync().unwrap();
        engine.publish(None).unwrap();
        engine.reconcile().unwrap();

        transport.set_directory(&[("U1", "Ada", true)]);
        engine.sync().unwrap();

        assert!(db.get_member("U1").unwrap().is_none());
        let post = db.latest_occurrence().unwrap().unwrap().post_id;
        assert!(db.attendance_for_occurrence(&post).unwrap().is_empty());
    }

    #[test]
    fn test_publish_derives_date_and_seeds_reactions() {
        let (engine, transport, db) = engine();
        let post_id = engine.publish(None).unwrap();

        let occ = db.latest_occurrence().unwrap().unwrap();
        assert_eq!(occ.post_id, post_id);
        // 1_700_604_800 = 2023-11-21 22:13:20 UTC
        assert_eq!(occ.event_date, "21/11/23");
        assert_eq!(
            *transport.seeded.lock().unwrap(),
            vec!["thumbsup".to_string(), "thumbsdown".to_string()]
        );
    }

    #[test]
    fn test_publish_explicit_date_wins() {
        let (engine, _transport, db) = engine();
        engine.publish(Some(date("25/12/23"))).unwrap();
        let occ = db.latest_occurrence().unwrap().unwrap();
        assert_eq!(occ.event_date, "25/12/23");
    }

    #[test]
    fn test_reconcile_with_no_occurrence() {
        let (engine, transport, _db) = engine();
        transport.set_directory(&[("U1", "Ada", false)]);
        assert_eq!(
            engine.reconcile().unwrap(),
            ReconcileOutcome::NothingToReconcile
        );
    }

    #[test]
    fn test_reconcile_merges_reactions() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[
            ("A", "Ada", false),
            ("B", "Bob", false),
            ("C", "Cleo", false),
        ]);
        engine.publish(None).unwrap();
        transport.set_reactions(&[("thumbsup", &["A", "C"]), ("thumbsdown", &["B"])]);

        let outcome = engine.reconcile().unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Reconciled {
                newly_present: 2,
                newly_absent: 1
            }
        );

        let post = db.latest_occurrence().unwrap().unwrap().post_id;
        let rows = db.attendance_for_occurrence(&post).unwrap();
        let presence: Vec<(String, Option<bool>)> = rows
            .into_iter()
            .map(|r| (r.member_id, r.present))
            .collect();
        assert_eq!(
            presence,
            vec![
                ("A".to_string(), Some(true)),
                ("B".to_string(), Some(false)),
                ("C".to_string(), Some(true)),
            ]
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[("A", "Ada", false), ("B", "Bob", false)]);
        engine.publish(None).unwrap();
        transport.set_reactions(&[("thumbsup", &["A"])]);

        engine.reconcile().unwrap();
        let post = db.latest_occurrence().unwrap().unwrap().post_id;
        let first: Vec<Option<bool>> = db
            .attendance_for_occurrence(&post)
            .unwrap()
            .into_iter()
            .map(|r| r.present)
            .collect();

        // Same snapshot again: no cell changes, counts are zero.
        let outcome = engine.reconcile().unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Reconciled {
                newly_present: 0,
                newly_absent: 0
            }
        );
        let second: Vec<Option<bool>> = db
            .attendance_for_occurrence(&post)
            .unwrap()
            .into_iter()
            .map(|r| r.present)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reconcile_conflicting_reactions_resolve_to_absent() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[("A", "Ada", false)]);
        engine.publish(None).unwrap();
        transport.set_reactions(&[("thumbsup", &["A"]), ("thumbsdown", &["A"])]);

        engine.reconcile().unwrap();
        let post = db.latest_occurrence().unwrap().unwrap().post_id;
        let rows = db.attendance_for_occurrence(&post).unwrap();
        assert_eq!(rows[0].present, Some(false));
    }

    #[test]
    fn test_reconcile_ignores_unconfigured_reaction_kinds() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[("A", "Ada", false)]);
        engine.publish(None).unwrap();
        transport.set_reactions(&[("tada", &["A"])]);

        let outcome = engine.reconcile().unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Reconciled {
                newly_present: 0,
                newly_absent: 0
            }
        );
        let post = db.latest_occurrence().unwrap().unwrap().post_id;
        assert_eq!(db.attendance_for_occurrence(&post).unwrap()[0].present, None);
    }

    #[test]
    fn test_ignore_flag_scopes_to_future_expansions() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[("A", "Ada", false), ("B", "Bob", false)]);
        engine.publish(None).unwrap();
        engine.reconcile().unwrap();
        let o1 = db.latest_occurrence().unwrap().unwrap().post_id;
        assert!(db.attendance_exists("B", &o1).unwrap());

        engine.set_ignore("B", true).unwrap();
        engine.publish(None).unwrap();
        engine.reconcile().unwrap();
        let o2 = db.latest_occurrence().unwrap().unwrap().post_id;
        assert_ne!(o1, o2);

        // Old row survives; new occurrence excludes B.
        assert!(db.attendance_exists("B", &o1).unwrap());
        assert!(!db.attendance_exists("B", &o2).unwrap());
        assert!(db.attendance_exists("A", &o2).unwrap());
    }

    #[test]
    fn test_set_ignore_unknown_member() {
        let (engine, _transport, _db) = engine();
        assert!(matches!(
            engine.set_ignore("U9", true),
            Err(EngineError::MemberNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_member_fails_closed() {
        let (engine, transport, _db) = engine();
        transport.set_directory(&[
            ("U1", "Ada", false),
            ("U2", "Bob", false),
            ("U3", "Bob", false),
        ]);
        engine.sync().unwrap();

        assert_eq!(engine.resolve_member("Ada").unwrap(), "U1");
        assert!(matches!(
            engine.resolve_member("Cleo"),
            Err(EngineError::MemberNotFound(_))
        ));
        assert!(matches!(
            engine.resolve_member("Bob"),
            Err(EngineError::AmbiguousName(_))
        ));
    }

    #[test]
    fn test_record_attendance_manual_override() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[("U1", "Ada", false)]);
        engine.publish(None).unwrap();
        engine.reconcile().unwrap();
        let occ = db.latest_occurrence().unwrap().unwrap();

        engine
            .record_attendance("Ada", date(&occ.event_date), true)
            .unwrap();
        let rows = db.attendance_for_occurrence(&occ.post_id).unwrap();
        assert_eq!(rows[0].present, Some(true));

        assert!(matches!(
            engine.record_attendance("Ada", date("01/01/99"), true),
            Err(EngineError::OccurrenceNotFound(_))
        ));
    }

    #[test]
    fn test_record_attendance_without_expanded_row() {
        let (engine, transport, db) = engine();
        transport.set_directory(&[("U1", "Ada", false)]);
        engine.publish(None).unwrap();
        engine.reconcile().unwrap();

        // Bob joins after the expansion ran.
        transport.set_directory(&[("U1", "Ada", false), ("U2", "Bob", false)]);
        engine.sync().unwrap();

        let occ = db.latest_occurrence().unwrap().unwrap();
        assert!(matches!(
            engine.record_attendance("Bob", date(&occ.event_date), true),
            Err(EngineError::AttendanceNotRecorded { .. })
        ));
    }

    #[test]
    fn test_absent_streak_over_window() {
        let (engine, transport, _db) = engine();
        transport.set_directory(&[("A", "Ada", false), ("B", "Bob", false)]);

        // Four occurrences; Bob reacts present once, Ada never reacts.
        for i in 0..4 {
            engine.publish(None).unwrap();
            if i == 2 {
                transport.set_reactions(&[("thumbsup", &["B"])]);
            } else {
                transport.set_reactions(&[]);
            }
            engine.reconcile().unwrap();
        }

        assert_eq!(engine.absent_streak(None).unwrap(), vec!["Ada".to_string()]);
        // With a window of 1 Bob also qualifies: he did not react to the
        // latest occurrence.
        assert_eq!(
            engine.absent_streak(Some(1)).unwrap(),
            vec!["Ada".to_string(), "Bob".to_string()]
        );
    }

    #[test]
    fn test_attendance_sheet() {
        let (engine, transport, _db) = engine();
        transport.set_directory(&[("A", "Ada", false), ("B", "Bob", false), ("C", "Cleo", false)]);
        engine.publish(None).unwrap();
        transport.set_reactions(&[("thumbsup", &["A"]), ("thumbsdown", &["B"])]);
        engine.reconcile().unwrap();

        let sheet = engine.attendance(None).unwrap().unwrap();
        assert_eq!(sheet.occurrence.event_date, "21/11/23");
        let by_member: Vec<(String, Presence)> = sheet
            .records
            .into_iter()
            .map(|r| (r.member_id, r.present))
            .collect();
        assert_eq!(
            by_member,
            vec![
                ("A".to_string(), Presence::Present),
                ("B".to_string(), Presence::Absent),
                ("C".to_string(), Presence::Unknown),
            ]
        );

        // Same sheet addressed by date; a date with no occurrence is None.
        assert!(engine.attendance(Some(date("21/11/23"))).unwrap().is_some());
        assert!(engine.attendance(Some(date("01/01/99"))).unwrap().is_none());
    }

    #[test]
    fn test_roster_reflects_ignore_flags() {
        let (engine, transport, _db) = engine();
        transport.set_directory(&[("A", "Ada", false), ("B", "Bob", false)]);
        engine.sync().unwrap();
        engine.set_ignore("B", true).unwrap();

        let roster = engine.roster().unwrap();
        assert_eq!(roster.len(), 2);
        assert!(!roster[0].ignored);
        assert!(roster[1].ignored);
    }

    #[test]
    fn test_member_info_passthrough() {
        let (engine, transport, _db) = engine();
        transport.set_directory(&[("U1", "Ada", false)]);
        let info = engine.member_info("U1").unwrap();
        assert_eq!(info.display_name, "Ada");
        assert!(matches!(
            engine.member_info("U9"),
            Err(EngineError::Transport(TransportError::Api { .. }))
        ));
    }

    #[test]
    fn test_event_date_from_post_id() {
        assert_eq!(event_date_from_post_id("1477581478").unwrap(), "27/10/16");
        assert_eq!(
            event_date_from_post_id("1477581478.000200").unwrap(),
            "27/10/16"
        );
        assert!(event_date_from_post_id("not-a-ts").is_err());
    }
}
