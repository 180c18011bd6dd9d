//! Slack Web API response shapes — only the fields the engine consumes.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub ts: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BareResponse {
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReactionsGetResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub message: Option<ReactedMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ReactedMessage {
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Deserialize)]
pub struct Reaction {
    pub name: String,
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsersListResponse {
    pub ok: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub members: Vec<SlackUser>,
}

#[derive(Debug, Deserialize)]
pub struct UsersInfoResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub user: Option<SlackUser>,
}

/// A user record as it appears in users.list / users.info. The display name
/// lives either at the top level (real_name) or inside the profile object,
/// depending on the API surface.
#[derive(Debug, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_admin: bool,
    pub real_name: Option<String>,
    pub profile: Option<SlackProfile>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlackProfile {
    pub real_name: Option<String>,
}

impl SlackUser {
    pub fn display_name(&self) -> String {
        self.real_name
            .clone()
            .or_else(|| self.profile.as_ref().and_then(|p| p.real_name.clone()))
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}
