use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::auth::policy::{self, Operation};
use crate::dto::Pagination;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;
use crate::students::dto::{CreateStudent, UpdateStudent, UploadResponse};
use crate::students::repo::Student;
use crate::validation::is_valid_email;

const UPLOAD_BODY_LIMIT: usize = 5 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/students", post(create_student).get(list_students))
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route(
            "/students/:id/upload-picture",
            post(upload_picture).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_student(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppJson(payload): AppJson<CreateStudent>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    policy::authorize(caller.role, Operation::CreateStudent)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("name is required".into()));
    }
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidInput("invalid email".into()));
    }

    let student = Student::create(&state.db, name, &email).await?;
    info!(student_id = %student.id, "student created");
    Ok((StatusCode::CREATED, Json(student)))
}

#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<Vec<Student>>, ApiError> {
    policy::authorize(caller.role, Operation::ReadStudents)?;
    let students = Student::list(&state.db, p.limit, p.offset).await?;
    Ok(Json(students))
}

#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Student>, ApiError> {
    policy::authorize(caller.role, Operation::ReadStudents)?;
    let student = Student::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("student"))?;
    Ok(Json(student))
}

#[instrument(skip(state, payload))]
pub async fn update_student(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateStudent>,
) -> Result<Json<Student>, ApiError> {
    policy::authorize(caller.role, Operation::UpdateStudent)?;

    let name = payload.name.as_deref().map(str::trim);
    if let Some(n) = name {
        if n.is_empty() {
            return Err(ApiError::InvalidInput("name must not be empty".into()));
        }
    }
    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase());
    if let Some(e) = email.as_deref() {
        if !is_valid_email(e) {
            return Err(ApiError::InvalidInput("invalid email".into()));
        }
    }

    let student = Student::update(&state.db, id, name, email.as_deref())
        .await?
        .ok_or(ApiError::NotFound("student"))?;
    info!(student_id = %student.id, "student updated");
    Ok(Json(student))
}

#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    policy::authorize(caller.role, Operation::DeleteStudent)?;
    if !Student::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("student"));
    }
    info!(student_id = %id, "student deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /students/:id/upload-picture, multipart field `file`.
///
/// The object store publishes the file atomically before the database row is
/// pointed at it; if pointing fails the stored object is removed again, so a
/// `profile_pic` reference never names a partial or orphaned upload.
#[instrument(skip(state, multipart))]
pub async fn upload_picture(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppPath(id): AppPath<i64>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    policy::authorize(caller.role, Operation::UpdateStudent)?;

    let previous = Student::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("student"))?
        .profile_pic;

    let (data, ext) = read_image_field(&mut multipart).await?;
    let key = format!("students/{}/{}.{}", id, Uuid::new_v4(), ext);
    state.storage.put(&key, data).await?;

    match Student::set_profile_pic(&state.db, id, &key).await {
        Ok(Some(_)) => {
            // replaced picture is unreferenced now; removal is best-effort
            if let Some(old) = previous {
                if old != key {
                    let _ = state.storage.delete(&old).await;
                }
            }
            info!(student_id = %id, key = %key, "profile picture uploaded");
            let filename = key.rsplit('/').next().unwrap_or(&key).to_string();
            Ok(Json(UploadResponse {
                filename,
                file_path: key,
                message: "profile picture uploaded",
            }))
        }
        Ok(None) => {
            let _ = state.storage.delete(&key).await;
            Err(ApiError::NotFound("student"))
        }
        Err(e) => {
            let _ = state.storage.delete(&key).await;
            Err(e)
        }
    }
}

async fn read_image_field(multipart: &mut Multipart) -> Result<(Bytes, &'static str), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let ext = ext_from_mime(&content_type).ok_or_else(|| {
            ApiError::InvalidInput(
                "unsupported image type; use JPEG, PNG, GIF, or WebP".into(),
            )
        })?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        if data.is_empty() {
            return Err(ApiError::InvalidInput("file is empty".into()));
        }
        return Ok((data, ext));
    }
    Err(ApiError::InvalidInput("file field is required".into()))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn ext_from_mime_covers_allowed_types() {
        assert_eq!(super::ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/png"), Some("png"));
        assert_eq!(super::ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(super::ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(super::ext_from_mime("application/pdf"), None);
        assert_eq!(super::ext_from_mime(""), None);
    }
}
