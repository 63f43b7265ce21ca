//! Dealer network and service center management

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Dealer, ServiceCenter};
use shared::validation;

/// Dealer and service-center service
#[derive(Clone)]
pub struct DealerService {
    db: PgPool,
}

/// Input for creating a dealer or sub-dealer
#[derive(Debug, Deserialize)]
pub struct CreateDealerInput {
    pub name: String,
    pub city: Option<String>,
    pub contact_phone: Option<String>,
}

/// Input for creating a service center
#[derive(Debug, Deserialize)]
pub struct CreateServiceCenterInput {
    pub name: String,
    pub city: Option<String>,
    pub contact_phone: Option<String>,
}

type DealerRow = (
    Uuid,
    String,
    Option<String>,
    Option<String>,
    Option<Uuid>,
    bool,
    DateTime<Utc>,
);

fn dealer_from_row(row: DealerRow) -> Dealer {
    Dealer {
        id: row.0,
        name: row.1,
        city: row.2,
        contact_phone: row.3,
        parent_dealer_id: row.4,
        is_active: row.5,
        created_at: row.6,
    }
}

type CenterRow = (
    Uuid,
    String,
    Option<String>,
    Option<String>,
    bool,
    DateTime<Utc>,
);

fn center_from_row(row: CenterRow) -> ServiceCenter {
    ServiceCenter {
        id: row.0,
        name: row.1,
        city: row.2,
        contact_phone: row.3,
        is_active: row.4,
        created_at: row.5,
    }
}

const DEALER_COLUMNS: &str =
    "id, name, city, contact_phone, parent_dealer_id, is_active, created_at";

const CENTER_COLUMNS: &str = "id, name, city, contact_phone, is_active, created_at";

impl DealerService {
    /// Create a new DealerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn validate_party_input(name: &str, contact_phone: Option<&str>) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name is required".to_string(),
            });
        }

        if let Some(phone) = contact_phone {
            validation::validate_pk_phone(phone).map_err(|message| AppError::Validation {
                field: "contact_phone".to_string(),
                message: message.to_string(),
            })?;
        }

        Ok(())
    }

    /// Create a main dealer
    pub async fn create_dealer(&self, input: CreateDealerInput) -> AppResult<Dealer> {
        Self::validate_party_input(&input.name, input.contact_phone.as_deref())?;

        let row = sqlx::query_as::<_, DealerRow>(&format!(
            r#"
            INSERT INTO dealers (name, city, contact_phone)
            VALUES ($1, $2, $3)
            RETURNING {DEALER_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.city)
        .bind(&input.contact_phone)
        .fetch_one(&self.db)
        .await?;

        Ok(dealer_from_row(row))
    }

    /// Create a sub-dealer under a main dealer
    pub async fn create_sub_dealer(
        &self,
        parent_dealer_id: Uuid,
        input: CreateDealerInput,
    ) -> AppResult<Dealer> {
        Self::validate_party_input(&input.name, input.contact_phone.as_deref())?;

        let parent = self.get_dealer(parent_dealer_id).await?;

        // Only one level of nesting: a sub-dealer cannot have sub-dealers
        if !parent.is_main_dealer() {
            return Err(AppError::Validation {
                field: "parent_dealer_id".to_string(),
                message: "Sub-dealers cannot have their own sub-dealers".to_string(),
            });
        }

        let row = sqlx::query_as::<_, DealerRow>(&format!(
            r#"
            INSERT INTO dealers (name, city, contact_phone, parent_dealer_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {DEALER_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.city)
        .bind(&input.contact_phone)
        .bind(parent_dealer_id)
        .fetch_one(&self.db)
        .await?;

        Ok(dealer_from_row(row))
    }

    /// Get a dealer by ID
    pub async fn get_dealer(&self, dealer_id: Uuid) -> AppResult<Dealer> {
        let row = sqlx::query_as::<_, DealerRow>(&format!(
            "SELECT {DEALER_COLUMNS} FROM dealers WHERE id = $1",
        ))
        .bind(dealer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Dealer".to_string()))?;

        Ok(dealer_from_row(row))
    }

    /// List main dealers
    pub async fn list_dealers(&self) -> AppResult<Vec<Dealer>> {
        let rows = sqlx::query_as::<_, DealerRow>(&format!(
            "SELECT {DEALER_COLUMNS} FROM dealers WHERE parent_dealer_id IS NULL ORDER BY name",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(dealer_from_row).collect())
    }

    /// List sub-dealers of a main dealer
    pub async fn list_sub_dealers(&self, parent_dealer_id: Uuid) -> AppResult<Vec<Dealer>> {
        // 404 for an unknown parent rather than an empty list
        self.get_dealer(parent_dealer_id).await?;

        let rows = sqlx::query_as::<_, DealerRow>(&format!(
            "SELECT {DEALER_COLUMNS} FROM dealers WHERE parent_dealer_id = $1 ORDER BY name",
        ))
        .bind(parent_dealer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(dealer_from_row).collect())
    }

    /// Create a service center
    pub async fn create_service_center(
        &self,
        input: CreateServiceCenterInput,
    ) -> AppResult<ServiceCenter> {
        Self::validate_party_input(&input.name, input.contact_phone.as_deref())?;

        let row = sqlx::query_as::<_, CenterRow>(&format!(
            r#"
            INSERT INTO service_centers (name, city, contact_phone)
            VALUES ($1, $2, $3)
            RETURNING {CENTER_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.city)
        .bind(&input.contact_phone)
        .fetch_one(&self.db)
        .await?;

        Ok(center_from_row(row))
    }

    /// Get a service center by ID
    pub async fn get_service_center(&self, center_id: Uuid) -> AppResult<ServiceCenter> {
        let row = sqlx::query_as::<_, CenterRow>(&format!(
            "SELECT {CENTER_COLUMNS} FROM service_centers WHERE id = $1",
        ))
        .bind(center_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service center".to_string()))?;

        Ok(center_from_row(row))
    }

    /// List service centers
    pub async fn list_service_centers(&self) -> AppResult<Vec<ServiceCenter>> {
        let rows = sqlx::query_as::<_, CenterRow>(&format!(
            "SELECT {CENTER_COLUMNS} FROM service_centers ORDER BY name",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(center_from_row).collect())
    }
}
