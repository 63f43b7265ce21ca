//! Spare-parts ledger service
//!
//! Dispatch lines are immutable lots; stock is never stored as a counter.
//! The remaining balance of a service center is derived on demand by
//! folding dispatched quantities against REPLACEMENT usage.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{PartDispatch, PartDispatchItem};
use shared::stock::{fold_balances, StockBalance};
use shared::validation;

/// Spare-parts ledger service
#[derive(Clone)]
pub struct PartsService {
    db: PgPool,
}

/// One requested line of a part dispatch
#[derive(Debug, Deserialize)]
pub struct PartDispatchItemInput {
    pub part_code: String,
    pub quantity: i32,
}

/// Input for dispatching spare parts to a service center
#[derive(Debug, Deserialize)]
pub struct CreatePartDispatchInput {
    pub service_center_id: Uuid,
    pub items: Vec<PartDispatchItemInput>,
}

/// A part dispatch together with its lines
#[derive(Debug, Serialize)]
pub struct PartDispatchView {
    #[serde(flatten)]
    pub dispatch: PartDispatch,
    pub service_center_name: String,
    pub items: Vec<PartDispatchItem>,
}

type ItemRow = (Uuid, Uuid, String, String, i32);

fn item_from_row(row: ItemRow) -> PartDispatchItem {
    PartDispatchItem {
        id: row.0,
        dispatch_id: row.1,
        part_code: row.2,
        part_name: row.3,
        quantity: row.4,
    }
}

impl PartsService {
    /// Create a new PartsService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Dispatch spare parts to a service center. The dispatch number is
    /// assigned here as the next number in the current year's sequence.
    pub async fn create_part_dispatch(
        &self,
        created_by: Uuid,
        input: CreatePartDispatchInput,
    ) -> AppResult<PartDispatchView> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "At least one item is required".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for item in &input.items {
            validation::validate_quantity(item.quantity).map_err(|message| {
                AppError::Validation {
                    field: "quantity".to_string(),
                    message: format!("{}: {}", item.part_code, message),
                }
            })?;

            if !seen.insert(item.part_code.as_str()) {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: format!("Duplicate part code in dispatch: {}", item.part_code),
                });
            }
        }

        let center_name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM service_centers WHERE id = $1 AND is_active = true",
        )
        .bind(input.service_center_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service center".to_string()))?;

        let part_codes: Vec<String> = input.items.iter().map(|i| i.part_code.clone()).collect();
        let known_parts = sqlx::query_as::<_, (String, String)>(
            "SELECT part_code, name FROM parts WHERE part_code = ANY($1)",
        )
        .bind(&part_codes)
        .fetch_all(&self.db)
        .await?;

        let names: std::collections::HashMap<_, _> = known_parts.into_iter().collect();
        for code in &part_codes {
            if !names.contains_key(code) {
                return Err(AppError::NotFound(format!("Part {}", code)));
            }
        }

        let mut tx = self.db.begin().await?;

        let year = Utc::now().year();

        // Serialize number assignment within the year
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(i64::from(year))
            .execute(&mut *tx)
            .await?;

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM part_dispatches WHERE dispatch_number LIKE $1",
        )
        .bind(format!("PD-{}-%", year))
        .fetch_one(&mut *tx)
        .await?;

        let dispatch_number = validation::format_part_dispatch_number(year, count + 1);

        let (dispatch_id, dispatched_at) = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO part_dispatches (dispatch_number, service_center_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, dispatched_at
            "#,
        )
        .bind(&dispatch_number)
        .bind(input.service_center_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let part_name = &names[&item.part_code];
            let row = sqlx::query_as::<_, ItemRow>(
                r#"
                INSERT INTO part_dispatch_items (dispatch_id, part_code, part_name, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING id, dispatch_id, part_code, part_name, quantity
                "#,
            )
            .bind(dispatch_id)
            .bind(&item.part_code)
            .bind(part_name)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;

            items.push(item_from_row(row));
        }

        tx.commit().await?;

        tracing::info!(
            dispatch_number = %dispatch_number,
            service_center_id = %input.service_center_id,
            lines = items.len(),
            "Dispatched spare parts"
        );

        Ok(PartDispatchView {
            dispatch: PartDispatch {
                id: dispatch_id,
                dispatch_number,
                service_center_id: input.service_center_id,
                dispatched_at,
                created_by: Some(created_by),
            },
            service_center_name: center_name,
            items,
        })
    }

    /// Get a part dispatch with its lines
    pub async fn get_part_dispatch(&self, dispatch_id: Uuid) -> AppResult<PartDispatchView> {
        let row = sqlx::query_as::<_, (Uuid, String, Uuid, DateTime<Utc>, Option<Uuid>, String)>(
            r#"
            SELECT d.id, d.dispatch_number, d.service_center_id, d.dispatched_at, d.created_by,
                   sc.name
            FROM part_dispatches d
            JOIN service_centers sc ON sc.id = d.service_center_id
            WHERE d.id = $1
            "#,
        )
        .bind(dispatch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Part dispatch".to_string()))?;

        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, dispatch_id, part_code, part_name, quantity
            FROM part_dispatch_items
            WHERE dispatch_id = $1
            ORDER BY part_code
            "#,
        )
        .bind(dispatch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PartDispatchView {
            dispatch: PartDispatch {
                id: row.0,
                dispatch_number: row.1,
                service_center_id: row.2,
                dispatched_at: row.3,
                created_by: row.4,
            },
            service_center_name: row.5,
            items: items.into_iter().map(item_from_row).collect(),
        })
    }

    /// List part dispatches, optionally scoped to a service center
    pub async fn list_part_dispatches(
        &self,
        service_center_id: Option<Uuid>,
    ) -> AppResult<Vec<PartDispatchView>> {
        let ids = match service_center_id {
            Some(center_id) => {
                sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM part_dispatches WHERE service_center_id = $1 \
                     ORDER BY dispatched_at DESC",
                )
                .bind(center_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM part_dispatches ORDER BY dispatched_at DESC",
                )
                .fetch_all(&self.db)
                .await?
            }
        };

        let mut views = Vec::with_capacity(ids.len());
        for id in ids {
            views.push(self.get_part_dispatch(id).await?);
        }

        Ok(views)
    }

    /// Derive the stock balance of a service center from the ledger. Nothing
    /// is cached: the result is a pure fold over dispatches and REPLACEMENT
    /// usage.
    pub async fn derive_stock(&self, service_center_id: Uuid) -> AppResult<Vec<StockBalance>> {
        let center_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM service_centers WHERE id = $1)",
        )
        .bind(service_center_id)
        .fetch_one(&self.db)
        .await?;

        if !center_exists {
            return Err(AppError::NotFound("Service center".to_string()));
        }

        let dispatched = sqlx::query_as::<_, (String, String, i64)>(
            r#"
            SELECT i.part_code, i.part_name, COALESCE(SUM(i.quantity), 0)
            FROM part_dispatch_items i
            JOIN part_dispatches d ON d.id = i.dispatch_id
            WHERE d.service_center_id = $1
            GROUP BY i.part_code, i.part_name
            "#,
        )
        .bind(service_center_id)
        .fetch_all(&self.db)
        .await?;

        // Repairs never consume stock, so only REPLACEMENT rows count
        let used = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT rp.part_code, COALESCE(SUM(rp.quantity), 0)
            FROM replaced_parts rp
            JOIN part_dispatch_items i ON i.id = rp.part_dispatch_item_id
            JOIN part_dispatches d ON d.id = i.dispatch_id
            WHERE d.service_center_id = $1 AND rp.replacement_type = 'replacement'
            GROUP BY rp.part_code
            "#,
        )
        .bind(service_center_id)
        .fetch_all(&self.db)
        .await?;

        Ok(fold_balances(dispatched, used))
    }
}
