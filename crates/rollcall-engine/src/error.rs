use rollcall_types::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The membership directory could not be fetched; the roster is left
    /// unchanged. Transient — the next scheduled sync retries.
    #[error("directory fetch failed: {0}")]
    DirectoryFetch(#[source] TransportError),

    /// A message or reaction call failed; the current run aborts with the
    /// store in the consistent state the prior steps produced.
    #[error("transport call failed: {0}")]
    Transport(#[from] TransportError),

    /// Name lookup found nobody. Surfaced to the caller as user-facing
    /// text, not retried.
    #[error("no member named '{0}'")]
    MemberNotFound(String),

    /// Name lookup matched more than one member. Fail closed rather than
    /// silently picking one.
    #[error("multiple members share the name '{0}'")]
    AmbiguousName(String),

    #[error("no occurrence recorded for {0}")]
    OccurrenceNotFound(String),

    /// The member exists but was not part of that occurrence's expansion,
    /// so there is no row to update.
    #[error("{name} has no attendance record for {date}")]
    AttendanceNotRecorded { name: String, date: String },

    #[error(transparent)]
    Db(#[from] anyhow::Error),
}
