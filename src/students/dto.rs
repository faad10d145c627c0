use serde::{Deserialize, Serialize};

/// Request body for creating a student.
#[derive(Debug, Deserialize)]
pub struct CreateStudent {
    pub name: String,
    pub email: String,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateStudent {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Response after a profile picture upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub file_path: String,
    pub message: &'static str,
}
