mod backend;
mod image;

pub use backend::{AdvisorBackend, LlmAdvisor};
pub use image::ImagePayload;

use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Prompt sent when the student attaches an image without typing anything.
pub const DEFAULT_IMAGE_PROMPT: &str = "Analyze this image.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "I couldn't generate a response. Please try again.";
pub const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub role: TurnRole,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
    pub pending: bool,
}

impl ChatTurn {
    fn new(role: TurnRole, text: impl Into<String>, image: Option<ImagePayload>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            image,
            pending: false,
        }
    }
}

/// Why a submission was turned away. The transcript is left untouched.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SubmitRejection {
    Empty,
    InFlight,
}

impl SubmitRejection {
    pub fn message(&self) -> &'static str {
        match self {
            SubmitRejection::Empty => "Type a message or attach an image first.",
            SubmitRejection::InFlight => "The advisor is still answering the previous message.",
        }
    }
}

/// Work handed from `begin` to `resolve_pending`.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    pub turn_id: Uuid,
    pub prompt: String,
    pub image: Option<ImagePayload>,
}

/// Chat transcript for one workspace with at most one outstanding request.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorSession {
    turns: Vec<ChatTurn>,
    in_flight: bool,
}

impl AdvisorSession {
    pub fn new(welcome_message: &str) -> Self {
        Self {
            turns: vec![ChatTurn::new(TurnRole::Assistant, welcome_message, None)],
            in_flight: false,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Appends the user turn and a pending assistant turn, and marks the
    /// session busy until `resolve` is called with the returned turn id.
    pub fn begin(
        &mut self,
        text: &str,
        image: Option<ImagePayload>,
    ) -> Result<PendingQuery, SubmitRejection> {
        if self.in_flight {
            return Err(SubmitRejection::InFlight);
        }
        let blank = text.trim().is_empty();
        if blank && image.is_none() {
            return Err(SubmitRejection::Empty);
        }

        let prompt = if blank {
            DEFAULT_IMAGE_PROMPT.to_string()
        } else {
            text.to_string()
        };

        let user_turn = ChatTurn::new(TurnRole::User, text, image.clone());
        self.turns.push(user_turn);

        let mut placeholder = ChatTurn::new(TurnRole::Assistant, "", None);
        placeholder.pending = true;
        let turn_id = placeholder.id;
        self.turns.push(placeholder);
        self.in_flight = true;

        Ok(PendingQuery {
            turn_id,
            prompt,
            image,
        })
    }

    /// Fills the pending turn in place and frees the session for the next submission.
    pub fn resolve(&mut self, turn_id: Uuid, text: impl Into<String>) {
        match self.turns.iter_mut().find(|turn| turn.id == turn_id) {
            Some(turn) => {
                turn.text = text.into();
                turn.pending = false;
            }
            None => warn!(%turn_id, "pending advisor turn not found in transcript"),
        }
        self.in_flight = false;
    }
}

/// Runs the external query for `pending` and writes the outcome back into the session.
pub async fn resolve_pending<B>(
    session: &RwLock<AdvisorSession>,
    backend: &B,
    pending: PendingQuery,
    timeout: Duration,
) where
    B: AdvisorBackend,
{
    let outcome = tokio::time::timeout(
        timeout,
        backend.query(&pending.prompt, pending.image.as_ref()),
    )
    .await;

    let text = match outcome {
        Ok(Ok(text)) if !text.trim().is_empty() => text,
        Ok(Ok(_)) => {
            warn!(turn_id = %pending.turn_id, "advisor returned an empty response");
            EMPTY_RESPONSE_MESSAGE.to_string()
        }
        Ok(Err(err)) => {
            warn!(?err, turn_id = %pending.turn_id, "advisor query failed");
            FAILURE_MESSAGE.to_string()
        }
        Err(_) => {
            warn!(turn_id = %pending.turn_id, ?timeout, "advisor query timed out");
            FAILURE_MESSAGE.to_string()
        }
    };

    session.write().await.resolve(pending.turn_id, text);
    info!(turn_id = %pending.turn_id, "advisor turn resolved");
}
