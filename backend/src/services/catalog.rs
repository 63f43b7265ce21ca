//! Catalog service for inverter models and the spare-part master list

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{InverterModel, Part};
use shared::validation;

/// Catalog service
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Input for creating an inverter model
#[derive(Debug, Deserialize)]
pub struct CreateModelInput {
    pub brand: String,
    pub model_code: String,
    pub name: String,
    pub capacity_kva: Decimal,
    pub parts_warranty_months: i32,
    pub service_warranty_months: i32,
}

/// Input for creating a spare part
#[derive(Debug, Deserialize)]
pub struct CreatePartInput {
    pub part_code: String,
    pub name: String,
}

type ModelRow = (
    Uuid,
    String,
    String,
    String,
    Decimal,
    i32,
    i32,
    DateTime<Utc>,
);

fn model_from_row(row: ModelRow) -> InverterModel {
    InverterModel {
        id: row.0,
        brand: row.1,
        model_code: row.2,
        name: row.3,
        capacity_kva: row.4,
        parts_warranty_months: row.5,
        service_warranty_months: row.6,
        created_at: row.7,
    }
}

const MODEL_COLUMNS: &str = "id, brand, model_code, name, capacity_kva, \
     parts_warranty_months, service_warranty_months, created_at";

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an inverter model
    pub async fn create_model(&self, input: CreateModelInput) -> AppResult<InverterModel> {
        if input.brand.trim().is_empty() {
            return Err(AppError::Validation {
                field: "brand".to_string(),
                message: "Brand is required".to_string(),
            });
        }

        if input.model_code.trim().is_empty() {
            return Err(AppError::Validation {
                field: "model_code".to_string(),
                message: "Model code is required".to_string(),
            });
        }

        if input.parts_warranty_months < 0 || input.service_warranty_months < 0 {
            return Err(AppError::Validation {
                field: "warranty_months".to_string(),
                message: "Warranty months cannot be negative".to_string(),
            });
        }

        if input.capacity_kva <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "capacity_kva".to_string(),
                message: "Capacity must be positive".to_string(),
            });
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inverter_models WHERE model_code = $1",
        )
        .bind(&input.model_code)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("model_code".to_string()));
        }

        let row = sqlx::query_as::<_, ModelRow>(&format!(
            r#"
            INSERT INTO inverter_models
                (brand, model_code, name, capacity_kva, parts_warranty_months, service_warranty_months)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MODEL_COLUMNS}
            "#,
        ))
        .bind(&input.brand)
        .bind(&input.model_code)
        .bind(&input.name)
        .bind(input.capacity_kva)
        .bind(input.parts_warranty_months)
        .bind(input.service_warranty_months)
        .fetch_one(&self.db)
        .await?;

        Ok(model_from_row(row))
    }

    /// Get an inverter model by ID
    pub async fn get_model(&self, model_id: Uuid) -> AppResult<InverterModel> {
        let row = sqlx::query_as::<_, ModelRow>(&format!(
            "SELECT {MODEL_COLUMNS} FROM inverter_models WHERE id = $1",
        ))
        .bind(model_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inverter model".to_string()))?;

        Ok(model_from_row(row))
    }

    /// List all inverter models
    pub async fn list_models(&self) -> AppResult<Vec<InverterModel>> {
        let rows = sqlx::query_as::<_, ModelRow>(&format!(
            "SELECT {MODEL_COLUMNS} FROM inverter_models ORDER BY brand, model_code",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(model_from_row).collect())
    }

    /// Create a spare part in the master list
    pub async fn create_part(&self, input: CreatePartInput) -> AppResult<Part> {
        validation::validate_part_code(&input.part_code).map_err(|message| {
            AppError::Validation {
                field: "part_code".to_string(),
                message: message.to_string(),
            }
        })?;

        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Part name is required".to_string(),
            });
        }

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM parts WHERE part_code = $1")
                .bind(&input.part_code)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("part_code".to_string()));
        }

        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            r#"
            INSERT INTO parts (part_code, name)
            VALUES ($1, $2)
            RETURNING part_code, name, created_at
            "#,
        )
        .bind(&input.part_code)
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        Ok(Part {
            part_code: row.0,
            name: row.1,
            created_at: row.2,
        })
    }

    /// List all spare parts
    pub async fn list_parts(&self) -> AppResult<Vec<Part>> {
        let rows = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT part_code, name, created_at FROM parts ORDER BY part_code",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Part {
                part_code: row.0,
                name: row.1,
                created_at: row.2,
            })
            .collect())
    }
}
