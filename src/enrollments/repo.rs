use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::{constraint_name, ApiError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
}

/// Listing row joined with the names the dashboard displays.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EnrollmentDetail {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub course_id: i64,
    pub course_title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
}

impl Enrollment {
    /// A single INSERT; the (student, course) uniqueness check and both FK
    /// checks are atomic with it, so a concurrent duplicate or a concurrent
    /// parent delete yields the same typed error as the sequential case.
    pub async fn create(
        db: &PgPool,
        student_id: i64,
        course_id: i64,
    ) -> Result<Enrollment, ApiError> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (student_id, course_id)
            VALUES ($1, $2)
            RETURNING id, student_id, course_id, enrolled_at
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(db)
        .await
        .map_err(|e| match constraint_name(&e).as_deref() {
            Some("enrollments_student_id_course_id_key") => ApiError::DuplicateEnrollment,
            Some("enrollments_student_id_fkey") => ApiError::NotFound("student"),
            Some("enrollments_course_id_fkey") => ApiError::NotFound("course"),
            _ => ApiError::from(e),
        })
    }

    pub async fn list(
        db: &PgPool,
        student_id: Option<i64>,
        course_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EnrollmentDetail>, ApiError> {
        let rows = sqlx::query_as::<_, EnrollmentDetail>(
            r#"
            SELECT e.id, e.student_id, s.name AS student_name,
                   e.course_id, c.title AS course_title, e.enrolled_at
            FROM enrollments e
            JOIN students s ON s.id = e.student_id
            JOIN courses c ON c.id = e.course_id
            WHERE ($1::BIGINT IS NULL OR e.student_id = $1)
              AND ($2::BIGINT IS NULL OR e.course_id = $2)
            ORDER BY e.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query(r#"DELETE FROM enrollments WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
