//! Change event processing
//!
//! Decodes inbound webhook envelopes, checks the verification token, and
//! applies member changes to the store one record at a time.
//!
//! Accepted envelope shapes:
//!
//! ```text
//! {"token": "...", "type": "event_callback",
//!  "event": {"type": "member_change", "user": { ...directory member... }}}
//!
//! {"token": "...", "type": "url_verification", "challenge": "..."}
//! ```
//!
//! `user_change` is accepted as a synonym of `member_change`. Any other
//! outer or inner kind is ignored once the token checks out.

use crate::error::{Error, Result};
use crate::mapping::to_member_record;
use crate::member::{DirectoryMember, Member};
use crate::traits::MemberStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Inner event kind for a member profile change
pub const MEMBER_CHANGE: &str = "member_change";

/// Directory-native name for the same event
pub const USER_CHANGE: &str = "user_change";

const EVENT_CALLBACK: &str = "event_callback";
const URL_VERIFICATION: &str = "url_verification";

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    token: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    event: Option<RawEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    user: Option<serde_json::Value>,
}

/// A decoded webhook envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Event delivery
    EventCallback { token: String, event: ChangeEvent },

    /// Endpoint ownership check
    UrlVerification { token: String, challenge: String },

    /// Any other outer kind
    Other { token: String, kind: String },
}

/// The inner event of an `event_callback` envelope
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A member's profile changed; carries the full new profile
    MemberChange(DirectoryMember),

    /// An event kind this service does not act on
    Other { kind: String },
}

impl Envelope {
    /// Decode a raw request body
    ///
    /// Only the payload of member change events is decoded into a typed
    /// member. Payloads of other kinds are never inspected.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let envelope: RawEnvelope = serde_json::from_slice(raw)
            .map_err(|e| Error::decode(format!("invalid envelope: {}", e)))?;

        let token = envelope.token;
        match envelope.kind.as_str() {
            EVENT_CALLBACK => {
                let event = envelope
                    .event
                    .ok_or_else(|| Error::decode("event_callback envelope without event"))?;
                Ok(Envelope::EventCallback {
                    token,
                    event: ChangeEvent::from_raw(event)?,
                })
            }
            URL_VERIFICATION => {
                let challenge = envelope
                    .challenge
                    .ok_or_else(|| Error::decode("url_verification envelope without challenge"))?;
                Ok(Envelope::UrlVerification { token, challenge })
            }
            _ => Ok(Envelope::Other {
                token,
                kind: envelope.kind,
            }),
        }
    }

    /// The verification token the sender presented
    pub fn token(&self) -> &str {
        match self {
            Envelope::EventCallback { token, .. }
            | Envelope::UrlVerification { token, .. }
            | Envelope::Other { token, .. } => token,
        }
    }
}

impl ChangeEvent {
    fn from_raw(event: RawEvent) -> Result<Self> {
        if event.kind != MEMBER_CHANGE && event.kind != USER_CHANGE {
            return Ok(ChangeEvent::Other { kind: event.kind });
        }

        let user = event
            .user
            .ok_or_else(|| Error::decode(format!("{} event without user payload", event.kind)))?;
        let member: DirectoryMember = serde_json::from_value(user)
            .map_err(|e| Error::decode(format!("invalid {} payload: {}", event.kind, e)))?;
        Ok(ChangeEvent::MemberChange(member))
    }
}

/// Result of handling one envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// A member record was written
    Applied { member_id: String },

    /// Authentic but not acted on
    Ignored { kind: String },

    /// URL verification; the challenge should be echoed to the sender
    Challenge(String),
}

/// Webhook change event processor
///
/// Each envelope is handled on its own: no ordering across events, no
/// deduplication. Two events for the same member race and the last write
/// wins. Failures are logged here and returned; they are never retried.
pub struct ChangeEventProcessor {
    store: Arc<dyn MemberStore>,
    verification_token: String,
}

impl ChangeEventProcessor {
    /// Create a processor that accepts envelopes carrying `verification_token`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is empty: an envelope
    /// without a `token` field decodes to an empty token and would pass.
    pub fn new(
        store: Arc<dyn MemberStore>,
        verification_token: impl Into<String>,
    ) -> Result<Self> {
        let verification_token = verification_token.into();
        if verification_token.is_empty() {
            return Err(Error::config("Webhook verification token cannot be empty"));
        }

        Ok(Self {
            store,
            verification_token,
        })
    }

    /// Handle one raw envelope
    pub async fn handle(&self, raw: &[u8]) -> Result<ChangeOutcome> {
        let result = self.process(raw).await;

        match &result {
            Ok(ChangeOutcome::Applied { .. }) => {
                // Logged by the write task
            }
            Ok(ChangeOutcome::Ignored { kind }) => {
                debug!("Ignoring event of kind '{}'", kind);
            }
            Ok(ChangeOutcome::Challenge(_)) => {
                info!("Answered URL verification challenge");
            }
            Err(Error::TokenMismatch) => {
                warn!("Rejected event with mismatched verification token");
            }
            Err(e @ (Error::Decode(_) | Error::InvalidInput(_))) => {
                warn!("Dropped malformed event: {}", e);
            }
            Err(e @ (Error::Store(_) | Error::Io(_) | Error::Json(_))) => {
                debug!("Member change not applied: {}", e);
            }
            Err(e) => {
                error!("Failed to apply member change: {}", e);
            }
        }

        result
    }

    async fn process(&self, raw: &[u8]) -> Result<ChangeOutcome> {
        let envelope = Envelope::parse(raw)?;

        if envelope.token() != self.verification_token {
            return Err(Error::TokenMismatch);
        }

        match envelope {
            Envelope::UrlVerification { challenge, .. } => Ok(ChangeOutcome::Challenge(challenge)),
            Envelope::Other { kind, .. } => Ok(ChangeOutcome::Ignored { kind }),
            Envelope::EventCallback {
                event: ChangeEvent::Other { kind },
                ..
            } => Ok(ChangeOutcome::Ignored { kind }),
            Envelope::EventCallback {
                event: ChangeEvent::MemberChange(member),
                ..
            } => {
                let record = to_member_record(&member);
                record.validate()?;
                let member_id = record.id.clone();
                self.write(record).await?;
                Ok(ChangeOutcome::Applied { member_id })
            }
        }
    }

    /// Upsert one record on its own task
    ///
    /// The write runs to completion and logs its result even if the
    /// caller's future is dropped while it is in flight.
    async fn write(&self, record: Member) -> Result<()> {
        let store = Arc::clone(&self.store);
        let task = tokio::spawn(async move {
            let result = store.upsert_member(&record).await;
            match &result {
                Ok(()) => info!("Applied member change for {}", record.id),
                Err(e) => error!("Failed to apply member change for {}: {}", record.id, e),
            }
            result
        });

        task.await
            .map_err(|e| Error::store(format!("Member write task failed: {}", e)))?
    }
}

impl std::fmt::Debug for ChangeEventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeEventProcessor")
            .field("verification_token", &"<REDACTED>")
            .finish_non_exhaustive()
    }
}
