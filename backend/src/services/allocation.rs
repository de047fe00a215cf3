//! Project allocations
//!
//! Assigning stock to a project is an exit plus an allocation row; a return
//! is an entry that shrinks (or removes) the allocation. Deleting a project
//! returns everything still allocated to it before the project goes.

use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use serde::Serialize;
use shared::{
    validate_movement_quantity, Allocation, AssignInput, Item, ProjectAllocation, ReturnOutcome,
};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::services::ledger::{apply_entry, apply_exit};
use crate::services::locations::fetch_project;
use crate::services::notification::{notify_if_low, LowStockNotifier};

const ALLOCATION_COLUMNS: &str = "id, project_id, item_id, quantity_assigned, assigned_at, note";

/// Result of deleting a project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDeletion {
    pub project_id: i64,
    pub name: String,
    pub allocations_returned: usize,
    pub units_returned: i64,
}

/// Allocation service
#[derive(Clone)]
pub struct AllocationService {
    db: SqlitePool,
    notifier: Arc<dyn LowStockNotifier>,
}

impl AllocationService {
    /// Create a new AllocationService instance
    pub fn new(db: SqlitePool, notifier: Arc<dyn LowStockNotifier>) -> Self {
        Self { db, notifier }
    }

    /// Check stock out to a project
    pub async fn assign(&self, project_id: i64, input: AssignInput) -> AppResult<Allocation> {
        check_quantity(input.quantity)?;

        let mut tx = self.db.begin().await?;
        let project = fetch_project(&mut tx, project_id).await?;

        let note = input
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Asignado a proyecto {}", project.name));

        let item = apply_exit(
            &mut tx,
            input.item_id,
            input.quantity,
            Some(note.as_str()),
            Some(project.id),
        )
        .await?;

        let allocation = sqlx::query_as::<_, Allocation>(&format!(
            r#"
            INSERT INTO allocations (project_id, item_id, quantity_assigned, assigned_at, note)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            ALLOCATION_COLUMNS
        ))
        .bind(project.id)
        .bind(item.id)
        .bind(input.quantity)
        .bind(Utc::now())
        .bind(&note)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            allocation_id = allocation.id,
            project = %project.name,
            item_id = item.id,
            quantity = input.quantity,
            "Stock assigned to project"
        );
        notify_if_low(self.notifier.as_ref(), &item);

        Ok(allocation)
    }

    /// Bring stock back from a project. Returning the whole allocation
    /// removes it.
    pub async fn return_partial(&self, allocation_id: i64, quantity: i64) -> AppResult<ReturnOutcome> {
        check_quantity(quantity)?;

        let mut tx = self.db.begin().await?;
        let allocation = fetch_allocation(&mut tx, allocation_id).await?;

        if quantity > allocation.quantity_assigned {
            return Err(AppError::InvalidQuantity(format!(
                "Cannot return {} units, only {} are assigned",
                quantity, allocation.quantity_assigned
            )));
        }

        let remaining = if quantity == allocation.quantity_assigned {
            sqlx::query("DELETE FROM allocations WHERE id = ?")
                .bind(allocation_id)
                .execute(&mut *tx)
                .await?;
            None
        } else {
            let updated = sqlx::query_as::<_, Allocation>(&format!(
                "UPDATE allocations SET quantity_assigned = quantity_assigned - ? WHERE id = ? RETURNING {}",
                ALLOCATION_COLUMNS
            ))
            .bind(quantity)
            .bind(allocation_id)
            .fetch_one(&mut *tx)
            .await?;
            Some(updated)
        };

        let item = apply_entry(
            &mut tx,
            allocation.item_id,
            quantity,
            Some("Devolución de proyecto"),
            Some(allocation.project_id),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(allocation_id, quantity, fully_returned = remaining.is_none(), "Stock returned from project");
        notify_if_low(self.notifier.as_ref(), &item);

        Ok(ReturnOutcome {
            allocation: remaining,
            item_quantity: item.quantity,
        })
    }

    /// Delete a project, returning all of its allocated stock first.
    /// Either everything comes back and the project goes, or nothing changes.
    pub async fn delete_project(&self, project_id: i64) -> AppResult<ProjectDeletion> {
        let mut tx = self.db.begin().await?;
        let project = fetch_project(&mut tx, project_id).await?;

        let allocations = sqlx::query_as::<_, Allocation>(&format!(
            "SELECT {} FROM allocations WHERE project_id = ? ORDER BY id",
            ALLOCATION_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&mut *tx)
        .await?;

        let note = format!("Proyecto eliminado: {}", project.name);
        // Latest state per item; one alert per item once committed
        let mut restored: BTreeMap<i64, Item> = BTreeMap::new();
        let mut units_returned = 0;

        for allocation in &allocations {
            let item = apply_entry(
                &mut tx,
                allocation.item_id,
                allocation.quantity_assigned,
                Some(note.as_str()),
                Some(project_id),
            )
            .await?;
            units_returned += allocation.quantity_assigned;
            restored.insert(item.id, item);
        }

        sqlx::query("DELETE FROM allocations WHERE project_id = ?")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM locations WHERE id = ? AND kind = 'project'")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            project_id,
            name = %project.name,
            allocations = allocations.len(),
            units_returned,
            "Project deleted"
        );
        for item in restored.values() {
            notify_if_low(self.notifier.as_ref(), item);
        }

        Ok(ProjectDeletion {
            project_id,
            name: project.name,
            allocations_returned: allocations.len(),
            units_returned,
        })
    }

    /// Allocations of a project with item details, oldest first
    pub async fn list_for_project(&self, project_id: i64) -> AppResult<Vec<ProjectAllocation>> {
        let mut conn = self.db.acquire().await?;
        fetch_project(&mut conn, project_id).await?;

        let allocations = sqlx::query_as::<_, ProjectAllocation>(
            r#"
            SELECT a.id, a.project_id, a.item_id, i.code AS item_code,
                   i.description AS item_description, a.quantity_assigned, a.assigned_at, a.note
            FROM allocations a
            JOIN items i ON i.id = a.item_id
            WHERE a.project_id = ?
            ORDER BY a.assigned_at, a.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(allocations)
    }
}

fn check_quantity(quantity: i64) -> AppResult<()> {
    validate_movement_quantity(quantity).map_err(|msg| AppError::InvalidQuantity(msg.to_string()))
}

async fn fetch_allocation(conn: &mut SqliteConnection, allocation_id: i64) -> AppResult<Allocation> {
    sqlx::query_as::<_, Allocation>(&format!(
        "SELECT {} FROM allocations WHERE id = ?",
        ALLOCATION_COLUMNS
    ))
    .bind(allocation_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Allocation".to_string()))
}
