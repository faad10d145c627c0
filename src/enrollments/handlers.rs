use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extractors::CurrentUser;
use crate::auth::policy::{self, Operation};
use crate::enrollments::dto::{EnrollRequest, EnrollmentFilter};
use crate::enrollments::repo::{Enrollment, EnrollmentDetail};
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(enroll))
        .route("/enrollments", get(list_enrollments))
        .route("/enrollments/:id", delete(delete_enrollment))
}

#[instrument(skip(state, payload))]
pub async fn enroll(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppJson(payload): AppJson<EnrollRequest>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    policy::authorize(caller.role, Operation::Enroll)?;

    let enrollment = Enrollment::create(&state.db, payload.student_id, payload.course_id).await?;
    info!(
        enrollment_id = %enrollment.id,
        student_id = %enrollment.student_id,
        course_id = %enrollment.course_id,
        "student enrolled"
    );
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[instrument(skip(state))]
pub async fn list_enrollments(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppQuery(f): AppQuery<EnrollmentFilter>,
) -> Result<Json<Vec<EnrollmentDetail>>, ApiError> {
    policy::authorize(caller.role, Operation::ReadEnrollments)?;
    let rows =
        Enrollment::list(&state.db, f.student_id, f.course_id, f.limit, f.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    policy::authorize(caller.role, Operation::DeleteEnrollment)?;
    if !Enrollment::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("enrollment"));
    }
    info!(enrollment_id = %id, "enrollment deleted");
    Ok(StatusCode::NO_CONTENT)
}
