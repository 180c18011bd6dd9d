/// Database row types — these map directly to SQLite rows.
/// Distinct from rollcall-types API models to keep the DB layer independent.

pub struct MemberRow {
    pub id: String,
    pub display_name: String,
    pub ignored: bool,
}

pub struct OccurrenceRow {
    pub post_id: String,
    pub event_date: String,
    pub channel_id: String,
}

pub struct AttendanceRow {
    pub member_id: String,
    pub post_id: String,
    /// NULL = no reaction observed yet.
    pub present: Option<bool>,
}
