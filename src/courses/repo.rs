use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Course {
    pub async fn create(
        db: &PgPool,
        title: &str,
        description: Option<&str>,
    ) -> Result<Course, ApiError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description)
            VALUES ($1, $2)
            RETURNING id, title, description, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .fetch_one(db)
        .await?;
        Ok(course)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<Course>, ApiError> {
        let rows = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, created_at
            FROM courses
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

    pub async fn find(db: &PgPool, id: i64) -> Result<Option<Course>, ApiError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(course)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Course>, ApiError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, title, description, created_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(db)
        .await?;
        Ok(course)
    }

    /// Enrollment rows referencing the course go with it, in the same
    /// transaction, via the FK cascade.
    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query(r#"DELETE FROM courses WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
