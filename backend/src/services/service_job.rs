//! Service workflow: jobs with frozen warranty snapshots and replacement
//! records that debit spare-part stock
//!
//! A job freezes the warranty assessment at the visit date; later edits to
//! the model's terms or further passage of time never change what the job
//! recorded. Replacements consume stock from a named dispatch lot under a
//! row lock, so two concurrent debits cannot both fit into the last unit.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::lifecycle::{derive_cost_liability, replacement_cap_reached, TransitionBlock};
use shared::models::{CostLiability, ReplacedPart, ReplacementType, ServiceJob, ServiceType};
use shared::warranty::{assess_sold, WarrantyTerms};

/// Service workflow service
#[derive(Clone)]
pub struct ServiceJobService {
    db: PgPool,
}

/// Input for opening a service job
#[derive(Debug, Deserialize)]
pub struct CreateServiceJobInput {
    pub serial_number: String,
    pub reported_fault: String,
    pub visit_date: NaiveDate,
}

/// Input for recording a replaced or repaired part against a job
#[derive(Debug, Deserialize)]
pub struct AddReplacedPartInput {
    pub part_code: String,
    pub quantity: i32,
    pub replacement_type: ReplacementType,
    /// Source lot line; required for replacements, forbidden for repairs
    pub part_dispatch_item_id: Option<Uuid>,
    /// Required when the customer bears the cost
    pub charge_amount: Option<Decimal>,
    /// Defaults to today
    pub replacement_date: Option<NaiveDate>,
}

/// A job together with its unit and replacement records
#[derive(Debug, Serialize)]
pub struct ServiceJobView {
    #[serde(flatten)]
    pub job: ServiceJob,
    pub serial_number: String,
    pub service_center_name: String,
    pub replaced_parts: Vec<ReplacedPart>,
}

pub(crate) type JobRow = (
    Uuid,
    Uuid,
    Uuid,
    String,
    NaiveDate,
    bool,
    bool,
    NaiveDate,
    NaiveDate,
    String,
    Option<Uuid>,
    DateTime<Utc>,
);

pub(crate) const JOB_COLUMNS: &str = "id, unit_id, service_center_id, reported_fault, visit_date, \
     parts_in_warranty, service_in_warranty, parts_warranty_until, service_warranty_until, \
     service_type, created_by, created_at";

pub(crate) fn job_from_row(row: JobRow) -> AppResult<ServiceJob> {
    let service_type = ServiceType::from_str(&row.9)
        .ok_or_else(|| AppError::Internal(format!("Unknown service type: {}", row.9)))?;

    Ok(ServiceJob {
        id: row.0,
        unit_id: row.1,
        service_center_id: row.2,
        reported_fault: row.3,
        visit_date: row.4,
        parts_in_warranty: row.5,
        service_in_warranty: row.6,
        parts_warranty_until: row.7,
        service_warranty_until: row.8,
        service_type,
        created_by: row.10,
        created_at: row.11,
    })
}

type ReplacedPartRow = (
    Uuid,
    Uuid,
    Uuid,
    Option<Uuid>,
    String,
    i32,
    String,
    String,
    bool,
    Option<Decimal>,
    NaiveDate,
    DateTime<Utc>,
);

const REPLACED_PART_COLUMNS: &str = "id, service_job_id, unit_id, part_dispatch_item_id, \
     part_code, quantity, replacement_type, cost_liability, warranty_claim_eligible, \
     charge_amount, replacement_date, created_at";

fn replaced_part_from_row(row: ReplacedPartRow) -> AppResult<ReplacedPart> {
    let replacement_type = ReplacementType::from_str(&row.6)
        .ok_or_else(|| AppError::Internal(format!("Unknown replacement type: {}", row.6)))?;
    let cost_liability = CostLiability::from_str(&row.7)
        .ok_or_else(|| AppError::Internal(format!("Unknown cost liability: {}", row.7)))?;

    Ok(ReplacedPart {
        id: row.0,
        service_job_id: row.1,
        unit_id: row.2,
        part_dispatch_item_id: row.3,
        part_code: row.4,
        quantity: row.5,
        replacement_type,
        cost_liability,
        warranty_claim_eligible: row.8,
        charge_amount: row.9,
        replacement_date: row.10,
        created_at: row.11,
    })
}

/// Unit facts needed by the service workflow
struct ServicedUnit {
    unit_id: Uuid,
    sale_date: Option<NaiveDate>,
    parts_warranty_months: u32,
    service_warranty_months: u32,
}

impl ServiceJobService {
    /// Create a new ServiceJobService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn load_serviced_unit(&self, serial_number: &str) -> AppResult<ServicedUnit> {
        let row = sqlx::query_as::<_, (Uuid, Option<NaiveDate>, i32, i32)>(
            r#"
            SELECT u.id, u.sale_date, m.parts_warranty_months, m.service_warranty_months
            FROM units u
            JOIN inverter_models m ON m.id = u.model_id
            WHERE u.serial_number = $1
            "#,
        )
        .bind(serial_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Unit".to_string()))?;

        Ok(ServicedUnit {
            unit_id: row.0,
            sale_date: row.1,
            parts_warranty_months: row.2.max(0) as u32,
            service_warranty_months: row.3.max(0) as u32,
        })
    }

    /// Open a service job for a sold unit, freezing the warranty snapshot
    /// at the visit date
    pub async fn create_service_job(
        &self,
        service_center_id: Uuid,
        created_by: Uuid,
        input: CreateServiceJobInput,
    ) -> AppResult<ServiceJob> {
        if input.reported_fault.trim().is_empty() {
            return Err(AppError::Validation {
                field: "reported_fault".to_string(),
                message: "Reported fault is required".to_string(),
            });
        }

        let unit = self.load_serviced_unit(&input.serial_number).await?;

        let sale_date = unit.sale_date.ok_or_else(|| AppError::LifecycleConflict {
            serial_number: input.serial_number.clone(),
            reason: TransitionBlock::NotSold,
        })?;

        if input.visit_date < sale_date {
            return Err(AppError::Validation {
                field: "visit_date".to_string(),
                message: "Visit date cannot precede the sale date".to_string(),
            });
        }

        let terms = WarrantyTerms {
            parts_months: unit.parts_warranty_months,
            service_months: unit.service_warranty_months,
        };
        let assessment = assess_sold(sale_date, &terms, input.visit_date);

        // Free service is tied to the parts window, not the service window
        let service_type = if assessment.parts_in_warranty {
            ServiceType::Free
        } else {
            ServiceType::Paid
        };

        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            INSERT INTO service_jobs
                (unit_id, service_center_id, reported_fault, visit_date,
                 parts_in_warranty, service_in_warranty,
                 parts_warranty_until, service_warranty_until, service_type, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(unit.unit_id)
        .bind(service_center_id)
        .bind(&input.reported_fault)
        .bind(input.visit_date)
        .bind(assessment.parts_in_warranty)
        .bind(assessment.service_in_warranty)
        .bind(assessment.parts_until)
        .bind(assessment.service_until)
        .bind(service_type.as_str())
        .bind(created_by)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            serial_number = %input.serial_number,
            service_center_id = %service_center_id,
            service_type = service_type.as_str(),
            "Opened service job"
        );

        job_from_row(row)
    }

    /// Get a job with its replacement records
    pub async fn get_service_job(&self, job_id: Uuid) -> AppResult<ServiceJobView> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM service_jobs WHERE id = $1",
        ))
        .bind(job_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service job".to_string()))?;

        let job = job_from_row(row)?;

        let (serial_number, service_center_name) = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT u.serial_number, sc.name
            FROM service_jobs j
            JOIN units u ON u.id = j.unit_id
            JOIN service_centers sc ON sc.id = j.service_center_id
            WHERE j.id = $1
            "#,
        )
        .bind(job_id)
        .fetch_one(&self.db)
        .await?;

        let replaced_parts = self.list_replaced_parts(job_id).await?;

        Ok(ServiceJobView {
            job,
            serial_number,
            service_center_name,
            replaced_parts,
        })
    }

    /// List jobs, optionally scoped to a service center
    pub async fn list_service_jobs(
        &self,
        service_center_id: Option<Uuid>,
    ) -> AppResult<Vec<ServiceJob>> {
        let rows = match service_center_id {
            Some(center_id) => {
                sqlx::query_as::<_, JobRow>(&format!(
                    "SELECT {JOB_COLUMNS} FROM service_jobs WHERE service_center_id = $1 \
                     ORDER BY visit_date DESC, created_at DESC",
                ))
                .bind(center_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, JobRow>(&format!(
                    "SELECT {JOB_COLUMNS} FROM service_jobs \
                     ORDER BY visit_date DESC, created_at DESC",
                ))
                .fetch_all(&self.db)
                .await?
            }
        };

        rows.into_iter().map(job_from_row).collect()
    }

    /// List the replacement records of a job
    pub async fn list_replaced_parts(&self, job_id: Uuid) -> AppResult<Vec<ReplacedPart>> {
        let rows = sqlx::query_as::<_, ReplacedPartRow>(&format!(
            "SELECT {REPLACED_PART_COLUMNS} FROM replaced_parts WHERE service_job_id = $1 \
             ORDER BY created_at",
        ))
        .bind(job_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(replaced_part_from_row).collect()
    }

    /// Record a replaced (or repaired) part against a job
    ///
    /// Replacements debit the named dispatch lot under a row lock and count
    /// toward the per-part replacement cap. Repairs touch neither.
    pub async fn add_replaced_part(
        &self,
        acting_center_id: Uuid,
        job_id: Uuid,
        input: AddReplacedPartInput,
    ) -> AppResult<ReplacedPart> {
        shared::validation::validate_quantity(input.quantity).map_err(|message| {
            AppError::Validation {
                field: "quantity".to_string(),
                message: message.to_string(),
            }
        })?;

        let job = sqlx::query_as::<_, (Uuid, Uuid, NaiveDate)>(
            "SELECT unit_id, service_center_id, visit_date FROM service_jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service job".to_string()))?;

        let (unit_id, job_center_id, visit_date) = job;

        if job_center_id != acting_center_id {
            return Err(AppError::Forbidden(
                "Job belongs to another service center".to_string(),
            ));
        }

        let (serial_number, sale_date, parts_warranty_months) =
            sqlx::query_as::<_, (String, Option<NaiveDate>, i32)>(
                r#"
                SELECT u.serial_number, u.sale_date, m.parts_warranty_months
                FROM units u
                JOIN inverter_models m ON m.id = u.model_id
                WHERE u.id = $1
                "#,
            )
            .bind(unit_id)
            .fetch_one(&self.db)
            .await?;

        // A job only exists for a sold unit, but the guard stays total
        let sale_date = sale_date.ok_or_else(|| AppError::LifecycleConflict {
            serial_number: serial_number.clone(),
            reason: TransitionBlock::NotSold,
        })?;

        let part_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM parts WHERE part_code = $1)")
                .bind(&input.part_code)
                .fetch_one(&self.db)
                .await?;

        if !part_exists {
            return Err(AppError::NotFound(format!("Part {}", input.part_code)));
        }

        let replacement_date = input.replacement_date.unwrap_or_else(|| Utc::now().date_naive());

        if replacement_date < visit_date {
            return Err(AppError::Validation {
                field: "replacement_date".to_string(),
                message: "Replacement date cannot precede the visit date".to_string(),
            });
        }

        let (liability, derived_eligible) = derive_cost_liability(
            sale_date,
            parts_warranty_months.max(0) as u32,
            replacement_date,
        );

        // Claim eligibility only ever applies to physical replacements
        let warranty_claim_eligible =
            derived_eligible && input.replacement_type == ReplacementType::Replacement;

        let charge_amount = match liability {
            CostLiability::Factory => None,
            CostLiability::Customer => {
                let amount = input.charge_amount.ok_or_else(|| AppError::Validation {
                    field: "charge_amount".to_string(),
                    message: "Charge amount is required for customer-paid work".to_string(),
                })?;
                if amount <= Decimal::ZERO {
                    return Err(AppError::Validation {
                        field: "charge_amount".to_string(),
                        message: "Charge amount must be positive".to_string(),
                    });
                }
                Some(amount)
            }
        };

        let mut tx = self.db.begin().await?;

        // Lock the unit row first (always before any lot-line lock) so
        // concurrent replacements for the same unit serialize; the lot lock
        // alone would let two debits from different lots race the cap count
        sqlx::query("SELECT id FROM units WHERE id = $1 FOR UPDATE")
            .bind(unit_id)
            .execute(&mut *tx)
            .await?;

        let item_id = match input.replacement_type {
            ReplacementType::Repair => {
                if input.part_dispatch_item_id.is_some() {
                    return Err(AppError::Validation {
                        field: "part_dispatch_item_id".to_string(),
                        message: "Repairs do not consume a dispatch lot".to_string(),
                    });
                }
                None
            }
            ReplacementType::Replacement => {
                let item_id = input.part_dispatch_item_id.ok_or_else(|| {
                    AppError::Validation {
                        field: "part_dispatch_item_id".to_string(),
                        message: "Replacements must name the source dispatch lot".to_string(),
                    }
                })?;

                // Lock the lot line so concurrent debits serialize
                let item = sqlx::query_as::<_, (String, i32, Uuid, String)>(
                    r#"
                    SELECT i.part_code, i.quantity, d.service_center_id, d.dispatch_number
                    FROM part_dispatch_items i
                    JOIN part_dispatches d ON d.id = i.dispatch_id
                    WHERE i.id = $1
                    FOR UPDATE OF i
                    "#,
                )
                .bind(item_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Part dispatch item".to_string()))?;

                let (item_part_code, lot_quantity, lot_center_id, dispatch_number) = item;

                if lot_center_id != acting_center_id {
                    return Err(AppError::DispatchCenterMismatch { dispatch_number });
                }

                if item_part_code != input.part_code {
                    return Err(AppError::Validation {
                        field: "part_code".to_string(),
                        message: format!(
                            "Dispatch lot holds {}, not {}",
                            item_part_code, input.part_code
                        ),
                    });
                }

                let used = sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COALESCE(SUM(quantity), 0)
                    FROM replaced_parts
                    WHERE part_dispatch_item_id = $1 AND replacement_type = 'replacement'
                    "#,
                )
                .bind(item_id)
                .fetch_one(&mut *tx)
                .await?;

                let available = i64::from(lot_quantity) - used;
                if i64::from(input.quantity) > available {
                    return Err(AppError::InsufficientStock {
                        part_code: input.part_code.clone(),
                        requested: input.quantity,
                        available: available.max(0),
                    });
                }

                let prior = sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COUNT(*)
                    FROM replaced_parts
                    WHERE unit_id = $1 AND part_code = $2 AND replacement_type = 'replacement'
                    "#,
                )
                .bind(unit_id)
                .bind(&input.part_code)
                .fetch_one(&mut *tx)
                .await?;

                if replacement_cap_reached(prior) {
                    return Err(AppError::ReplacementCapExceeded {
                        serial_number: serial_number.clone(),
                        part_code: input.part_code.clone(),
                    });
                }

                Some(item_id)
            }
        };

        let row = sqlx::query_as::<_, ReplacedPartRow>(&format!(
            r#"
            INSERT INTO replaced_parts
                (service_job_id, unit_id, part_dispatch_item_id, part_code, quantity,
                 replacement_type, cost_liability, warranty_claim_eligible, charge_amount,
                 replacement_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {REPLACED_PART_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .bind(unit_id)
        .bind(item_id)
        .bind(&input.part_code)
        .bind(input.quantity)
        .bind(input.replacement_type.as_str())
        .bind(liability.as_str())
        .bind(warranty_claim_eligible)
        .bind(charge_amount)
        .bind(replacement_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            serial_number = %serial_number,
            part_code = %input.part_code,
            replacement_type = input.replacement_type.as_str(),
            cost_liability = liability.as_str(),
            "Recorded replaced part"
        );

        replaced_part_from_row(row)
    }
}
