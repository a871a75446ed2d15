use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::info;

use crate::{
    advisor::{AdvisorSession, ImagePayload, SubmitRejection, resolve_pending},
    web::{ApiError, AppState, json_error},
};

#[derive(Debug, Deserialize)]
pub struct SubmitMessage {
    #[serde(default)]
    pub text: String,
    /// Data URL (`data:image/png;base64,...`) or bare base64.
    #[serde(default)]
    pub image: Option<String>,
}

pub async fn transcript(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<AdvisorSession>) {
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let session = workspace.advisor.read().await.clone();
    (jar, Json(session))
}

/// Accepts a message and answers in the background; clients poll the transcript
/// until the pending assistant turn is filled in.
pub async fn submit_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SubmitMessage>,
) -> Result<(StatusCode, CookieJar, Json<AdvisorSession>), ApiError> {
    let image = match payload.image.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            ImagePayload::from_data_url(raw)
                .map_err(|err| json_error(StatusCode::BAD_REQUEST, err.message()))?,
        ),
        _ => None,
    };
    let max_image_bytes = state.config().advisor.max_image_bytes;
    if image
        .as_ref()
        .is_some_and(|image| image.bytes().len() > max_image_bytes)
    {
        return Err(json_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Images must be at most {max_image_bytes} bytes."),
        ));
    }

    let (jar, workspace) = state.workspaces().resolve(jar).await;

    let (pending, snapshot) = {
        let mut session = workspace.advisor.write().await;
        let pending = session.begin(&payload.text, image).map_err(|rejection| {
            let status = match rejection {
                SubmitRejection::InFlight => StatusCode::CONFLICT,
                SubmitRejection::Empty => StatusCode::BAD_REQUEST,
            };
            json_error(status, rejection.message())
        })?;
        (pending, session.clone())
    };

    info!(
        workspace_id = %workspace.id(),
        turn_id = %pending.turn_id,
        has_image = pending.image.is_some(),
        "advisor message accepted"
    );

    let backend = state.advisor();
    let timeout = state.advisor_timeout();
    tokio::spawn(async move {
        resolve_pending(&workspace.advisor, &backend, pending, timeout).await;
    });

    Ok((StatusCode::ACCEPTED, jar, Json(snapshot)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        advisor::TurnRole,
        web::test_support::{test_config, test_state},
    };

    fn message(text: &str, image: Option<&str>) -> Json<SubmitMessage> {
        Json(SubmitMessage {
            text: text.to_string(),
            image: image.map(str::to_string),
        })
    }

    async fn wait_until_idle(state: &AppState, jar: CookieJar) -> AdvisorSession {
        for _ in 0..200 {
            let (_, Json(session)) = transcript(State(state.clone()), jar.clone()).await;
            if !session.in_flight() {
                return session;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("advisor never resolved");
    }

    #[tokio::test]
    async fn submission_is_accepted_and_resolved_in_background() {
        let state = test_state();
        let (status, jar, Json(snapshot)) = submit_message(
            State(state.clone()),
            CookieJar::new(),
            message("", Some("data:image/png;base64,aGVsbG8=")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(snapshot.turns().len(), 3);
        assert!(snapshot.turns()[2].pending);

        let session = wait_until_idle(&state, jar).await;
        let reply = &session.turns()[2];
        assert_eq!(reply.role, TurnRole::Assistant);
        assert!(!reply.pending);
        assert!(!reply.text.is_empty());
    }

    #[tokio::test]
    async fn empty_message_is_bad_request() {
        let state = test_state();
        let err = submit_message(State(state), CookieJar::new(), message("  ", Some("")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1.message, SubmitRejection::Empty.message());
    }

    #[tokio::test]
    async fn non_image_attachment_is_bad_request() {
        let state = test_state();
        let err = submit_message(
            State(state),
            CookieJar::new(),
            message("what is this?", Some("data:text/plain;base64,aGVsbG8=")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn image_over_configured_size_is_too_large() {
        let mut config = test_config();
        config.advisor.max_image_bytes = 4;
        let state = AppState::new(config).unwrap();

        let err = submit_message(
            State(state),
            CookieJar::new(),
            message("", Some("data:image/png;base64,aGVsbG8=")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn second_message_while_answering_conflicts() {
        let state = test_state();
        let (_, jar, _) = submit_message(
            State(state.clone()),
            CookieJar::new(),
            message("How many credits do I need?", None),
        )
        .await
        .unwrap();

        wait_until_idle(&state, jar.clone()).await;
        let (jar, workspace) = state.workspaces().resolve(jar).await;
        workspace.advisor.write().await.begin("hold", None).unwrap();

        let err = submit_message(State(state), jar, message("Hello?", None))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
    }
}
