//! Location registry: fixed storage places and projects

use chrono::Utc;
use shared::{
    normalize_project_name, CreateProjectInput, Location, LocationKind, UpdateProjectInput,
};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{AppError, AppResult};

const LOCATION_COLUMNS: &str =
    "id, name, kind, active, description, client, start_date, end_date, status, created_at";

/// Location service
#[derive(Clone)]
pub struct LocationService {
    db: SqlitePool,
}

impl LocationService {
    /// Create a new LocationService instance
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List locations, optionally of one kind, ordered by name
    pub async fn list(&self, kind: Option<LocationKind>) -> AppResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM locations WHERE ?1 IS NULL OR kind = ?1 ORDER BY kind, name",
            LOCATION_COLUMNS
        ))
        .bind(kind)
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }

    /// Get any location, fixed or project
    pub async fn get(&self, location_id: i64) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM locations WHERE id = ?",
            LOCATION_COLUMNS
        ))
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Location".to_string()))
    }

    /// Get a project by ID
    pub async fn get_project(&self, project_id: i64) -> AppResult<Location> {
        let mut conn = self.db.acquire().await?;
        fetch_project(&mut conn, project_id).await
    }

    /// Create a project. Names are stored upper-case and must not collide
    /// with any existing location.
    pub async fn create_project(&self, input: CreateProjectInput) -> AppResult<Location> {
        let name = normalize_project_name(&input.name)
            .map_err(|msg| AppError::validation("name", msg, "Nombre de proyecto inválido"))?;
        check_dates(&input.start_date, &input.end_date)?;

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM locations WHERE name = ?)",
        )
        .bind(&name)
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::DuplicateName(name));
        }

        let project = sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO locations (name, kind, active, description, client, start_date, end_date, status, created_at)
            VALUES (?, 'project', 1, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(&name)
        .bind(trimmed(input.description))
        .bind(trimmed(input.client))
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(trimmed(input.status))
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent create
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::DuplicateName(name.clone());
                }
            }
            AppError::DatabaseError(e)
        })?;

        tracing::info!(project_id = project.id, name = %project.name, "Project created");

        Ok(project)
    }

    /// Edit project metadata
    pub async fn update_project(
        &self,
        project_id: i64,
        input: UpdateProjectInput,
    ) -> AppResult<Location> {
        let mut tx = self.db.begin().await?;
        let current = fetch_project(&mut tx, project_id).await?;

        let start_date = input.start_date.or(current.start_date);
        let end_date = input.end_date.or(current.end_date);
        check_dates(&start_date, &end_date)?;

        let project = sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE locations
            SET description = ?, client = ?, start_date = ?, end_date = ?, status = ?, active = ?
            WHERE id = ?
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(trimmed(input.description).or(current.description))
        .bind(trimmed(input.client).or(current.client))
        .bind(start_date)
        .bind(end_date)
        .bind(trimmed(input.status).or(current.status))
        .bind(input.active.unwrap_or(current.active))
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }
}

/// Load a project on the caller's connection. Fixed locations are not
/// projects and report as not found.
pub async fn fetch_project(conn: &mut SqliteConnection, project_id: i64) -> AppResult<Location> {
    sqlx::query_as::<_, Location>(&format!(
        "SELECT {} FROM locations WHERE id = ? AND kind = 'project'",
        LOCATION_COLUMNS
    ))
    .bind(project_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Project".to_string()))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_dates(
    start: &Option<chrono::NaiveDate>,
    end: &Option<chrono::NaiveDate>,
) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::validation(
                "end_date",
                "End date cannot be before the start date",
                "La fecha de fin no puede ser anterior a la de inicio",
            ));
        }
    }
    Ok(())
}
