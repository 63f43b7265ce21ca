//! Unit registration and lookup service
//!
//! Registration puts a serial into factory custody and writes the first
//! ownership event. Lookups never mutate; the lifecycle view is read
//! straight from the event log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::service_job::{job_from_row, JobRow, JOB_COLUMNS};
use shared::lifecycle::Custody;
use shared::models::{OwnershipEvent, OwnershipEventType, ServiceJob, Unit};
use shared::validation;
use shared::warranty::{self, WarrantyStatus, WarrantyTerms};

/// Unit registration and lookup service
#[derive(Clone)]
pub struct UnitService {
    db: PgPool,
}

/// Input for registering a single unit
#[derive(Debug, Deserialize)]
pub struct RegisterUnitInput {
    pub serial_number: String,
    pub model_id: Uuid,
}

/// Input for registering a batch of units of one model
#[derive(Debug, Deserialize)]
pub struct RegisterUnitsBulkInput {
    pub model_id: Uuid,
    pub serial_numbers: Vec<String>,
}

/// Lifecycle view of a unit: live state plus the full provenance trail
#[derive(Debug, Serialize)]
pub struct UnitLifecycle {
    pub unit: Unit,
    pub model_code: String,
    pub model_name: String,
    /// Live assessment as of today; jobs carry their own frozen snapshots
    pub warranty: WarrantyStatus,
    pub events: Vec<OwnershipEvent>,
    pub service_jobs: Vec<ServiceJob>,
}

/// Live warranty view for a unit
#[derive(Debug, Serialize)]
pub struct UnitWarranty {
    pub serial_number: String,
    pub sale_date: Option<NaiveDate>,
    pub warranty: WarrantyStatus,
}

pub(crate) type UnitRow = (
    Uuid,
    String,
    Uuid,
    String,
    Option<Uuid>,
    Option<Uuid>,
    Option<String>,
    Option<NaiveDate>,
    Option<String>,
    Option<String>,
    Option<Uuid>,
    DateTime<Utc>,
    DateTime<Utc>,
);

pub(crate) const UNIT_COLUMNS: &str = "id, serial_number, model_id, custody, holder_dealer_id, \
     dispatch_id, sale_invoice_no, sale_date, customer_name, customer_contact, \
     sold_by_dealer_id, created_at, updated_at";

pub(crate) fn unit_from_row(row: UnitRow) -> AppResult<Unit> {
    let custody = Custody::from_str(&row.3)
        .ok_or_else(|| AppError::Internal(format!("Unknown custody state: {}", row.3)))?;

    Ok(Unit {
        id: row.0,
        serial_number: row.1,
        model_id: row.2,
        custody,
        holder_dealer_id: row.4,
        dispatch_id: row.5,
        sale_invoice_no: row.6,
        sale_date: row.7,
        customer_name: row.8,
        customer_contact: row.9,
        sold_by_dealer_id: row.10,
        created_at: row.11,
        updated_at: row.12,
    })
}

/// Append an ownership event inside the caller's transaction
pub(crate) async fn append_ownership_event(
    tx: &mut Transaction<'_, Postgres>,
    unit_id: Uuid,
    event_type: OwnershipEventType,
    from_party: Option<&str>,
    to_party: Option<&str>,
    reference_id: Option<Uuid>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO ownership_events (unit_id, event_type, from_party, to_party, reference_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(unit_id)
    .bind(event_type.as_str())
    .bind(from_party)
    .bind(to_party)
    .bind(reference_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

impl UnitService {
    /// Create a new UnitService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a single unit into factory custody
    pub async fn register_unit(&self, input: RegisterUnitInput) -> AppResult<Unit> {
        let units = self
            .register_units_bulk(RegisterUnitsBulkInput {
                model_id: input.model_id,
                serial_numbers: vec![input.serial_number],
            })
            .await?;

        units
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Registration returned no unit".to_string()))
    }

    /// Register a batch of units; all serials are validated before any insert
    pub async fn register_units_bulk(
        &self,
        input: RegisterUnitsBulkInput,
    ) -> AppResult<Vec<Unit>> {
        if input.serial_numbers.is_empty() {
            return Err(AppError::Validation {
                field: "serial_numbers".to_string(),
                message: "At least one serial number is required".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for serial in &input.serial_numbers {
            validation::validate_serial_number(serial).map_err(|message| {
                AppError::Validation {
                    field: "serial_numbers".to_string(),
                    message: format!("{}: {}", serial, message),
                }
            })?;

            if !seen.insert(serial.as_str()) {
                return Err(AppError::Validation {
                    field: "serial_numbers".to_string(),
                    message: format!("Duplicate serial number in batch: {}", serial),
                });
            }
        }

        let model_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM inverter_models WHERE id = $1)")
                .bind(input.model_id)
                .fetch_one(&self.db)
                .await?;

        if !model_exists {
            return Err(AppError::NotFound("Inverter model".to_string()));
        }

        let taken = sqlx::query_scalar::<_, String>(
            "SELECT serial_number FROM units WHERE serial_number = ANY($1)",
        )
        .bind(&input.serial_numbers)
        .fetch_all(&self.db)
        .await?;

        if let Some(serial) = taken.first() {
            return Err(AppError::DuplicateEntry(format!("serial_number {}", serial)));
        }

        let mut tx = self.db.begin().await?;
        let mut units = Vec::with_capacity(input.serial_numbers.len());

        for serial in &input.serial_numbers {
            let row = sqlx::query_as::<_, UnitRow>(&format!(
                r#"
                INSERT INTO units (serial_number, model_id)
                VALUES ($1, $2)
                RETURNING {UNIT_COLUMNS}
                "#,
            ))
            .bind(serial)
            .bind(input.model_id)
            .fetch_one(&mut *tx)
            .await?;

            let unit = unit_from_row(row)?;
            append_ownership_event(
                &mut tx,
                unit.id,
                OwnershipEventType::Registered,
                None,
                Some("factory"),
                None,
            )
            .await?;

            units.push(unit);
        }

        tx.commit().await?;

        tracing::info!(count = units.len(), "Registered units");

        Ok(units)
    }

    /// Get a unit by serial number
    pub async fn get_unit(&self, serial_number: &str) -> AppResult<Unit> {
        let row = sqlx::query_as::<_, UnitRow>(&format!(
            "SELECT {UNIT_COLUMNS} FROM units WHERE serial_number = $1",
        ))
        .bind(serial_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Unit".to_string()))?;

        unit_from_row(row)
    }

    /// List units, optionally scoped to a holding dealer
    pub async fn list_units(&self, holder_dealer_id: Option<Uuid>) -> AppResult<Vec<Unit>> {
        let rows = match holder_dealer_id {
            Some(dealer_id) => {
                sqlx::query_as::<_, UnitRow>(&format!(
                    "SELECT {UNIT_COLUMNS} FROM units WHERE holder_dealer_id = $1 \
                     ORDER BY serial_number",
                ))
                .bind(dealer_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, UnitRow>(&format!(
                    "SELECT {UNIT_COLUMNS} FROM units ORDER BY serial_number",
                ))
                .fetch_all(&self.db)
                .await?
            }
        };

        rows.into_iter().map(unit_from_row).collect()
    }

    /// Full lifecycle view: live unit state plus the ordered event trail
    pub async fn get_lifecycle(&self, serial_number: &str) -> AppResult<UnitLifecycle> {
        let unit = self.get_unit(serial_number).await?;

        let (model_code, model_name, parts_months, service_months) =
            sqlx::query_as::<_, (String, String, i32, i32)>(
                "SELECT model_code, name, parts_warranty_months, service_warranty_months \
                 FROM inverter_models WHERE id = $1",
            )
            .bind(unit.model_id)
            .fetch_one(&self.db)
            .await?;

        let terms = WarrantyTerms {
            parts_months: parts_months.max(0) as u32,
            service_months: service_months.max(0) as u32,
        };
        let warranty = warranty::assess(unit.sale_date, &terms, Utc::now().date_naive());

        let event_rows = sqlx::query_as::<_, (
            Uuid,
            Uuid,
            String,
            Option<String>,
            Option<String>,
            Option<Uuid>,
            DateTime<Utc>,
        )>(
            r#"
            SELECT id, unit_id, event_type, from_party, to_party, reference_id, occurred_at
            FROM ownership_events
            WHERE unit_id = $1
            ORDER BY occurred_at, id
            "#,
        )
        .bind(unit.id)
        .fetch_all(&self.db)
        .await?;

        let events = event_rows
            .into_iter()
            .map(|row| {
                let event_type = OwnershipEventType::from_str(&row.2).ok_or_else(|| {
                    AppError::Internal(format!("Unknown ownership event type: {}", row.2))
                })?;
                Ok(OwnershipEvent {
                    id: row.0,
                    unit_id: row.1,
                    event_type,
                    from_party: row.3,
                    to_party: row.4,
                    reference_id: row.5,
                    occurred_at: row.6,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let job_rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM service_jobs WHERE unit_id = $1 \
             ORDER BY visit_date, created_at",
        ))
        .bind(unit.id)
        .fetch_all(&self.db)
        .await?;

        let service_jobs = job_rows
            .into_iter()
            .map(job_from_row)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(UnitLifecycle {
            unit,
            model_code,
            model_name,
            warranty,
            events,
            service_jobs,
        })
    }

    /// Live warranty assessment as of today
    pub async fn get_warranty(&self, serial_number: &str) -> AppResult<UnitWarranty> {
        let row = sqlx::query_as::<_, (String, Option<NaiveDate>, i32, i32)>(
            r#"
            SELECT u.serial_number, u.sale_date, m.parts_warranty_months, m.service_warranty_months
            FROM units u
            JOIN inverter_models m ON m.id = u.model_id
            WHERE u.serial_number = $1
            "#,
        )
        .bind(serial_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Unit".to_string()))?;

        let terms = WarrantyTerms {
            parts_months: row.2.max(0) as u32,
            service_months: row.3.max(0) as u32,
        };

        let today = Utc::now().date_naive();

        Ok(UnitWarranty {
            serial_number: row.0,
            sale_date: row.1,
            warranty: warranty::assess(row.1, &terms, today),
        })
    }
}
