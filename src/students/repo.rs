use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::{constraint_name, ApiError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub profile_pic: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

fn map_email_conflict(e: sqlx::Error) -> ApiError {
    match constraint_name(&e).as_deref() {
        Some("students_email_key") => ApiError::DuplicateEmail,
        _ => ApiError::from(e),
    }
}

impl Student {
    /// The unique constraint on email does the duplicate check atomically
    /// with the insert; there is no pre-check to race against.
    pub async fn create(db: &PgPool, name: &str, email: &str) -> Result<Student, ApiError> {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, profile_pic, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .fetch_one(db)
        .await
        .map_err(map_email_conflict)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<Student>, ApiError> {
        let rows = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, name, email, profile_pic, created_at
            FROM students
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i64) -> Result<Option<Student>, ApiError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, name, email, profile_pic, created_at
            FROM students
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(student)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Student>, ApiError> {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET name = COALESCE($2, name),
                email = COALESCE($3, email)
            WHERE id = $1
            RETURNING id, name, email, profile_pic, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(db)
        .await
        .map_err(map_email_conflict)
    }

    pub async fn set_profile_pic(
        db: &PgPool,
        id: i64,
        key: &str,
    ) -> Result<Option<Student>, ApiError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET profile_pic = $2
            WHERE id = $1
            RETURNING id, name, email, profile_pic, created_at
            "#,
        )
        .bind(id)
        .bind(key)
        .fetch_optional(db)
        .await?;
        Ok(student)
    }

    /// Enrollment rows referencing the student go with it, in the same
    /// transaction, via the FK cascade.
    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query(r#"DELETE FROM students WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
