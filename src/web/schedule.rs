use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    academics::{
        CopyConfirmation, PERIODS_PER_QUARTER, Quarter, QuarterSchedule, ScheduleGrid,
        ScheduleSlot, SlotField,
    },
    web::{ApiError, AppState, json_error},
};

#[derive(Debug, Deserialize)]
pub struct CopyRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct QuarterSlot {
    pub quarter: Quarter,
    #[serde(flatten)]
    pub slot: ScheduleSlot,
}

/// One period across all four quarters.
#[derive(Debug, Serialize)]
pub struct PeriodRow {
    pub period: u8,
    pub quarters: Vec<QuarterSlot>,
}

pub async fn full_schedule(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ScheduleGrid>) {
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let grid = workspace.schedule.read().await.clone();
    (jar, Json(grid))
}

pub async fn quarter_schedule(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(quarter): Path<Quarter>,
) -> (CookieJar, Json<QuarterSchedule>) {
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let schedule = workspace.schedule.read().await.quarter(quarter).clone();
    (jar, Json(schedule))
}

/// Narrows a path period to the slot range; anything else is a missing period.
fn period_number(raw: u32) -> Result<u8, ApiError> {
    u8::try_from(raw)
        .ok()
        .filter(|period| (1..=PERIODS_PER_QUARTER).contains(period))
        .ok_or_else(period_not_found)
}

fn period_not_found() -> ApiError {
    json_error(StatusCode::NOT_FOUND, "Period must be between 1 and 8.")
}

pub async fn period_row(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(period): Path<u32>,
) -> Result<(CookieJar, Json<PeriodRow>), ApiError> {
    let period = period_number(period)?;
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let grid = workspace.schedule.read().await;

    let slots = grid
        .period_across_quarters(period)
        .ok_or_else(period_not_found)?;

    let quarters = Quarter::ALL
        .into_iter()
        .zip(slots)
        .map(|(quarter, slot)| QuarterSlot {
            quarter,
            slot: slot.clone(),
        })
        .collect();

    Ok((jar, Json(PeriodRow { period, quarters })))
}

pub async fn update_slot(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((quarter, period)): Path<(Quarter, u32)>,
    Json(field): Json<SlotField>,
) -> Result<(CookieJar, Json<ScheduleSlot>), ApiError> {
    let period = period_number(period)?;
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let mut grid = workspace.schedule.write().await;

    if !grid.update_slot(quarter, period, field) {
        return Err(period_not_found());
    }

    let slot = grid
        .quarter(quarter)
        .slot(period)
        .cloned()
        .ok_or_else(period_not_found)?;
    Ok((jar, Json(slot)))
}

/// Destructive: only runs when the request carries `"confirm": true`. A missing
/// or unreadable body counts as unconfirmed.
pub async fn copy_to_all(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(source): Path<Quarter>,
    request: Option<Json<CopyRequest>>,
) -> Result<(CookieJar, Json<ScheduleGrid>), ApiError> {
    let confirmed = request.is_some_and(|Json(request)| request.confirm);
    let (jar, workspace) = state.workspaces().resolve(jar).await;
    let mut grid = workspace.schedule.write().await;

    grid.copy_quarter_to_all(source, CopyConfirmation::from(confirmed))
        .map_err(|err| json_error(StatusCode::PRECONDITION_REQUIRED, err.message()))?;
    info!(workspace_id = %workspace.id(), %source, "quarter copied to all quarters");

    Ok((jar, Json(grid.clone())))
}
