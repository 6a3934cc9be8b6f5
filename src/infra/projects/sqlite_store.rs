// SQLite-backed project store so the dashboard survives restarts.
//
// Tables:
// - projects: one row per project, including the issued key (if any)

use crate::core::projects::{Project, ProjectError, ProjectStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteProjectStore {
    pool: Pool<Sqlite>,
}

impl SqliteProjectStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), ProjectError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL,
                auth_key TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ProjectError::StorageError(e.to_string()))?;

        Ok(())
    }
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> Result<Project, ProjectError> {
    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| ProjectError::StorageError(e.to_string()))?
        .with_timezone(&Utc);

    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at,
        auth_key: row.get("auth_key"),
    })
}

#[async_trait]
impl ProjectStore for SqliteProjectStore {
    async fn insert(&self, project: Project) -> Result<(), ProjectError> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, description, created_at, auth_key)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.created_at.to_rfc3339())
        .bind(&project.auth_key)
        .execute(&self.pool)
        .await
        .map_err(|e| ProjectError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Project>, ProjectError> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ProjectError::StorageError(e.to_string()))?;

        row.as_ref().map(row_to_project).transpose()
    }

    async fn list(&self) -> Result<Vec<Project>, ProjectError> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ProjectError::StorageError(e.to_string()))?;

        rows.iter().map(row_to_project).collect()
    }

    async fn set_auth_key(&self, id: &str, key: &str) -> Result<bool, ProjectError> {
        let result = sqlx::query("UPDATE projects SET auth_key = ? WHERE id = ?")
            .bind(key)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ProjectError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, ProjectError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ProjectError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
