use rollcall_types::{DirectoryEntry, MemberInfo, PostedMessage, ReactionGroup, TransportError};

/// Blocking boundary to the messaging service. The engine never holds a
/// database lock across any of these calls: fetch first, then write.
pub trait ChatTransport: Send + Sync {
    fn post_message(&self, channel: &str, text: &str) -> Result<PostedMessage, TransportError>;

    fn add_reaction(
        &self,
        channel: &str,
        post_id: &str,
        reaction_kind: &str,
    ) -> Result<(), TransportError>;

    fn get_reactions(
        &self,
        channel: &str,
        post_id: &str,
    ) -> Result<Vec<ReactionGroup>, TransportError>;

    /// Full membership directory, including tombstoned entries.
    fn list_members(&self) -> Result<Vec<DirectoryEntry>, TransportError>;

    fn get_member_info(&self, id: &str) -> Result<MemberInfo, TransportError>;
}
