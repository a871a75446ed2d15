use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use crate::web::{AppState, advisor, courses, schedule};

pub fn build_router(state: AppState) -> Router {
    let message_body_limit = state.config().advisor.request_body_limit();

    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/courses",
            get(courses::list_courses).post(courses::add_course),
        )
        .route(
            "/api/courses/:id",
            patch(courses::update_course).delete(courses::remove_course),
        )
        .route("/api/gpa", get(courses::gpa_summary))
        .route("/api/schedule", get(schedule::full_schedule))
        .route("/api/schedule/:quarter", get(schedule::quarter_schedule))
        .route(
            "/api/schedule/:quarter/periods/:period",
            patch(schedule::update_slot),
        )
        .route(
            "/api/schedule/:quarter/copy-to-all",
            post(schedule::copy_to_all),
        )
        .route("/api/periods/:period", get(schedule::period_row))
        .route("/api/advisor/transcript", get(advisor::transcript))
        .route(
            "/api/advisor/messages",
            post(advisor::submit_message).layer(DefaultBodyLimit::max(message_body_limit)),
        )
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use serde_json::json;

    use crate::web::test_support::{spawn_server, test_config, test_state};

    use super::*;

    fn jpeg_data_url(decoded_len: usize) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            BASE64.encode(vec![0xAB_u8; decoded_len])
        )
    }

    #[tokio::test]
    async fn phone_sized_photo_is_accepted() {
        let base = spawn_server(test_state()).await;
        let image = jpeg_data_url(1_800_000);
        assert!(image.len() > 2 * 1024 * 1024);

        let response = reqwest::Client::new()
            .post(format!("{base}/api/advisor/messages"))
            .json(&json!({ "text": "What am I missing?", "image": image }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), StatusCode::ACCEPTED.as_u16());
    }

    #[tokio::test]
    async fn body_beyond_configured_limit_is_rejected() {
        let mut config = test_config();
        config.advisor.max_image_bytes = 1024;
        let base = spawn_server(AppState::new(config).unwrap()).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/advisor/messages"))
            .json(&json!({ "text": "", "image": jpeg_data_url(60_000) }))
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status().as_u16(),
            StatusCode::PAYLOAD_TOO_LARGE.as_u16()
        );
    }

    #[tokio::test]
    async fn copy_without_body_needs_confirmation() {
        let base = spawn_server(test_state()).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/schedule/Q1/copy-to-all"))
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status().as_u16(),
            StatusCode::PRECONDITION_REQUIRED.as_u16()
        );
    }

    #[tokio::test]
    async fn wide_period_numbers_are_not_found() {
        let base = spawn_server(test_state()).await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{base}/api/periods/300"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), StatusCode::NOT_FOUND.as_u16());

        let response = client
            .get(format!("{base}/api/periods/3"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), StatusCode::OK.as_u16());
    }
}
