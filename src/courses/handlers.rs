use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extractors::CurrentUser;
use crate::auth::policy::{self, Operation};
use crate::courses::dto::{CreateCourse, UpdateCourse};
use crate::courses::repo::Course;
use crate::dto::Pagination;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", post(create_course).get(list_courses))
        .route(
            "/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_course(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppJson(payload): AppJson<CreateCourse>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    policy::authorize(caller.role, Operation::CreateCourse)?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::InvalidInput("title is required".into()));
    }

    let course = Course::create(&state.db, title, payload.description.as_deref()).await?;
    info!(course_id = %course.id, "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<Vec<Course>>, ApiError> {
    policy::authorize(caller.role, Operation::ReadCourses)?;
    let courses = Course::list(&state.db, p.limit, p.offset).await?;
    Ok(Json(courses))
}

#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Course>, ApiError> {
    policy::authorize(caller.role, Operation::ReadCourses)?;
    let course = Course::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("course"))?;
    Ok(Json(course))
}

#[instrument(skip(state, payload))]
pub async fn update_course(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateCourse>,
) -> Result<Json<Course>, ApiError> {
    policy::authorize(caller.role, Operation::UpdateCourse)?;

    let title = payload.title.as_deref().map(str::trim);
    if let Some(t) = title {
        if t.is_empty() {
            return Err(ApiError::InvalidInput("title must not be empty".into()));
        }
    }

    let course = Course::update(&state.db, id, title, payload.description.as_deref())
        .await?
        .ok_or(ApiError::NotFound("course"))?;
    info!(course_id = %course.id, "course updated");
    Ok(Json(course))
}

#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    policy::authorize(caller.role, Operation::DeleteCourse)?;
    if !Course::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("course"));
    }
    info!(course_id = %id, "course deleted");
    Ok(StatusCode::NO_CONTENT)
}
