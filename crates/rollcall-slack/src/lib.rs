//! Slack Web API implementation of the engine's transport trait.
//!
//! Blocking on purpose: the engine is synchronous and never holds a store
//! lock across a network call, so a blocking client keeps the call graph
//! simple. The server wraps engine invocations in `spawn_blocking`.

pub mod wire;

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use rollcall_engine::ChatTransport;
use rollcall_types::{DirectoryEntry, MemberInfo, PostedMessage, ReactionGroup, TransportError};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

pub struct SlackTransport {
    client: Client,
    base_url: String,
    token: String,
    bot_name: String,
    bot_icon: String,
}

impl SlackTransport {
    pub fn new(token: String, bot_name: String, bot_icon: String) -> Result<Self, TransportError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), token, bot_name, bot_icon)
    }

    /// Base-url override, for pointing at a test double.
    pub fn with_base_url(
        base_url: String,
        token: String,
        bot_name: String,
        bot_icon: String,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            token,
            bot_name,
            bot_icon,
        })
    }

    fn call<P: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, TransportError> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(%method, "slack api call");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .form(params)
            .send()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        resp.json::<R>()
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }
}

fn api_err(error: Option<String>) -> TransportError {
    TransportError::Api {
        code: error.unwrap_or_else(|| "unknown_error".into()),
    }
}

impl ChatTransport for SlackTransport {
    fn post_message(&self, channel: &str, text: &str) -> Result<PostedMessage, TransportError> {
        let resp: wire::PostMessageResponse = self.call(
            "chat.postMessage",
            &[
                ("channel", channel),
                ("text", text),
                ("username", &self.bot_name),
                ("icon_emoji", &self.bot_icon),
            ],
        )?;
        if !resp.ok {
            return Err(api_err(resp.error));
        }
        match (resp.ts, resp.channel) {
            (Some(ts), Some(channel_id)) => Ok(PostedMessage {
                post_id: ts,
                channel_id,
            }),
            _ => Err(TransportError::MalformedResponse(
                "chat.postMessage returned ok without ts/channel".into(),
            )),
        }
    }

    fn add_reaction(
        &self,
        channel: &str,
        post_id: &str,
        reaction_kind: &str,
    ) -> Result<(), TransportError> {
        let resp: wire::BareResponse = self.call(
            "reactions.add",
            &[
                ("channel", channel),
                ("timestamp", post_id),
                ("name", reaction_kind),
            ],
        )?;
        if !resp.ok {
            return Err(api_err(resp.error));
        }
        Ok(())
    }

    fn get_reactions(
        &self,
        channel: &str,
        post_id: &str,
    ) -> Result<Vec<ReactionGroup>, TransportError> {
        let resp: wire::ReactionsGetResponse = self.call(
            "reactions.get",
            &[("channel", channel), ("timestamp", post_id)],
        )?;
        if !resp.ok {
            return Err(api_err(resp.error));
        }
        let reactions = resp.message.map(|m| m.reactions).unwrap_or_default();
        Ok(reactions
            .into_iter()
            .map(|r| ReactionGroup {
                reaction_kind: r.name,
                member_ids: r.users,
            })
            .collect())
    }

    fn list_members(&self) -> Result<Vec<DirectoryEntry>, TransportError> {
        let resp: wire::UsersListResponse = self.call("users.list", &[] as &[(&str, &str)])?;
        if !resp.ok {
            return Err(api_err(resp.error));
        }
        Ok(resp
            .members
            .into_iter()
            .map(|u| DirectoryEntry {
                display_name: u.display_name(),
                deleted: u.deleted,
                id: u.id,
            })
            .collect())
    }

    fn get_member_info(&self, id: &str) -> Result<MemberInfo, TransportError> {
        let resp: wire::UsersInfoResponse = self.call("users.info", &[("user", id)])?;
        if !resp.ok {
            return Err(api_err(resp.error));
        }
        let user = resp.user.ok_or_else(|| {
            TransportError::MalformedResponse("users.info returned ok without user".into())
        })?;
        Ok(MemberInfo {
            display_name: user.display_name(),
            is_admin: user.is_admin,
        })
    }
}
