use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    academics::{CourseField, CourseRecord, GpaSummary},
    web::{ApiError, AppState, json_error},
};

#[derive(Debug, Serialize)]
pub struct CourseListing {
    pub courses: Vec<CourseRecord>,
    pub summary: GpaSummary,
}

#[derive(Debug, Serialize)]
pub struct CourseChange {
    pub course: CourseRecord,
    pub summary: GpaSummary,
}

pub async fn list_courses(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<CourseListing>) {
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let store = workspace.courses.read().await;

    let listing = CourseListing {
        courses: store.courses().to_vec(),
        summary: store.summary(),
    };
    (jar, Json(listing))
}

pub async fn add_course(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (StatusCode, CookieJar, Json<CourseChange>) {
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let mut store = workspace.courses.write().await;

    let course = store.add().clone();
    info!(workspace_id = %workspace.id(), course_id = %course.id, "course added");

    let change = CourseChange {
        course,
        summary: store.summary(),
    };
    (StatusCode::CREATED, jar, Json(change))
}

pub async fn update_course(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(course_id): Path<Uuid>,
    Json(field): Json<CourseField>,
) -> Result<(CookieJar, Json<CourseChange>), ApiError> {
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let mut store = workspace.courses.write().await;

    if !store.update(course_id, field) {
        return Err(json_error(StatusCode::NOT_FOUND, "Course not found."));
    }

    let course = store
        .get(course_id)
        .cloned()
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "Course not found."))?;

    let change = CourseChange {
        course,
        summary: store.summary(),
    };
    Ok((jar, Json(change)))
}

/// Removing an unknown course is not an error; the listing is returned unchanged.
pub async fn remove_course(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(course_id): Path<Uuid>,
) -> (CookieJar, Json<CourseListing>) {
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let mut store = workspace.courses.write().await;

    if store.remove(course_id).is_some() {
        info!(workspace_id = %workspace.id(), %course_id, "course removed");
    }

    let listing = CourseListing {
        courses: store.courses().to_vec(),
        summary: store.summary(),
    };
    (jar, Json(listing))
}

pub async fn gpa_summary(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<GpaSummary>) {
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let summary = workspace.courses.read().await.summary();
    (jar, Json(summary))
}
