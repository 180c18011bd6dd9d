/// The slice of configuration the engine itself needs. Transport
/// credentials, bind addresses and the like stay in the binary.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Channel the prompt is posted in and reactions are read from.
    pub channel: String,
    /// Reaction kind counted as "present".
    pub present_reaction: String,
    /// Reaction kind counted as "absent".
    pub absent_reaction: String,
    /// Default absence-report window.
    pub report_window: u32,
    /// Text of the recurring prompt.
    pub prompt_text: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel: "general".into(),
            present_reaction: "thumbsup".into(),
            absent_reaction: "thumbsdown".into(),
            report_window: 4,
            prompt_text: "Rehearsal day! Please react with :thumbsup: (present) \
                          or :thumbsdown: (absent)."
                .into(),
        }
    }
}
