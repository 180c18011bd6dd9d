//! Boundary types for the messaging transport. The engine only ever sees
//! these shapes; the Slack client (or a test mock) produces them.

use serde::{Deserialize, Serialize};

/// Result of posting a message: the transport-assigned post identifier and
/// the resolved channel id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedMessage {
    pub post_id: String,
    pub channel_id: String,
}

/// One reaction kind on a post together with everyone who applied it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionGroup {
    pub reaction_kind: String,
    pub member_ids: Vec<String>,
}

/// One entry of the external membership directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub display_name: String,
    pub deleted: bool,
}

/// Profile details for a single member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfo {
    pub display_name: String,
    pub is_admin: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Http(String),
    #[error("transport API error: {code}")]
    Api { code: String },
    #[error("malformed transport response: {0}")]
    MalformedResponse(String),
}
