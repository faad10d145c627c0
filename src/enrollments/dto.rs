use serde::Deserialize;

/// Request body for enrolling a student in a course.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub student_id: i64,
    pub course_id: i64,
}

/// Query parameters for listing enrollments.
#[derive(Debug, Deserialize)]
pub struct EnrollmentFilter {
    pub student_id: Option<i64>,
    pub course_id: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}
