use serde::{Deserialize, Serialize};

/// A roster member. The id is the transport's opaque member identifier and
/// is stable across directory syncs; display names are not assumed unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub display_name: String,
    pub ignored: bool,
}

/// One instance of the recurring event, identified by its announcement post.
/// Post ids are the transport's monotonically increasing issuance tokens, so
/// ordering by post_id orders occurrences by recency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occurrence {
    pub post_id: String,
    pub event_date: String,
    pub channel_id: String,
}

/// Tri-state presence: `Unknown` means no reaction has been observed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Present,
    Absent,
    Unknown,
}

impl Presence {
    /// SQL mapping: NULL = unknown, 1 = present, 0 = absent.
    pub fn from_sql(value: Option<bool>) -> Self {
        match value {
            Some(true) => Presence::Present,
            Some(false) => Presence::Absent,
            None => Presence::Unknown,
        }
    }

    pub fn to_sql(self) -> Option<bool> {
        match self {
            Presence::Present => Some(true),
            Presence::Absent => Some(false),
            Presence::Unknown => None,
        }
    }
}

/// One attendance cell: member × occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub member_id: String,
    pub post_id: String,
    pub present: Presence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_sql_round_trip() {
        for p in [Presence::Present, Presence::Absent, Presence::Unknown] {
            assert_eq!(Presence::from_sql(p.to_sql()), p);
        }
        assert_eq!(Presence::from_sql(None), Presence::Unknown);
    }
}
