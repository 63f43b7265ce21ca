//! Custody movement service: dispatches, transfers, and sales
//!
//! Every batch operation reads custody snapshots under row locks, runs the
//! transition guards over the whole batch, and only then mutates. A single
//! failing serial rejects the batch with nothing written. The live custody
//! columns and the ownership event log are written in one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::unit::{append_ownership_event, unit_from_row, UnitRow, UNIT_COLUMNS};
use shared::lifecycle::{
    check_dispatchable, check_sellable, check_transferable, Custody, CustodySnapshot, Seller,
    TransitionBlock,
};
use shared::models::{OwnershipEventType, SaleRecord, Unit, UnitDispatch, UnitTransfer};

/// Custody movement service
#[derive(Clone)]
pub struct OwnershipService {
    db: PgPool,
}

/// Input for dispatching units from the factory to a main dealer
#[derive(Debug, Deserialize)]
pub struct CreateUnitDispatchInput {
    pub dispatch_number: String,
    pub dealer_id: Uuid,
    pub serial_numbers: Vec<String>,
}

/// Input for transferring units from a main dealer to one of its sub-dealers
#[derive(Debug, Deserialize)]
pub struct CreateUnitTransferInput {
    pub sub_dealer_id: Uuid,
    pub serial_numbers: Vec<String>,
}

/// Input for recording a customer sale
#[derive(Debug, Deserialize)]
pub struct RecordSaleInput {
    pub serial_number: String,
    pub invoice_no: String,
    pub sale_date: NaiveDate,
    pub customer_name: String,
    pub customer_contact: Option<String>,
}

/// Input for selling several units to one customer on one invoice
#[derive(Debug, Deserialize)]
pub struct RecordSalesBulkInput {
    pub serial_numbers: Vec<String>,
    pub invoice_no: String,
    pub sale_date: NaiveDate,
    pub customer_name: String,
    pub customer_contact: Option<String>,
}

/// A dispatch together with the serials it moved
#[derive(Debug, Serialize)]
pub struct UnitDispatchView {
    #[serde(flatten)]
    pub dispatch: UnitDispatch,
    pub dealer_name: String,
    pub serial_numbers: Vec<String>,
}

/// A transfer together with the serials it moved
#[derive(Debug, Serialize)]
pub struct UnitTransferView {
    #[serde(flatten)]
    pub transfer: UnitTransfer,
    pub sub_dealer_name: String,
    pub serial_numbers: Vec<String>,
}

/// Locked custody snapshot of one unit
struct LockedUnit {
    unit_id: Uuid,
    serial_number: String,
    snapshot: CustodySnapshot,
}

fn validate_serial_batch(serial_numbers: &[String]) -> AppResult<Vec<String>> {
    if serial_numbers.is_empty() {
        return Err(AppError::Validation {
            field: "serial_numbers".to_string(),
            message: "At least one serial number is required".to_string(),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for serial in serial_numbers {
        if !seen.insert(serial.as_str()) {
            return Err(AppError::Validation {
                field: "serial_numbers".to_string(),
                message: format!("Duplicate serial number in batch: {}", serial),
            });
        }
    }

    // Rows are locked in sorted serial order
    let mut sorted = serial_numbers.to_vec();
    sorted.sort();
    Ok(sorted)
}

/// Lock a unit row and read its custody snapshot
async fn lock_unit(
    tx: &mut Transaction<'_, Postgres>,
    serial_number: &str,
) -> AppResult<LockedUnit> {
    let row = sqlx::query_as::<_, (Uuid, String, Option<Uuid>, Option<NaiveDate>)>(
        "SELECT id, custody, holder_dealer_id, sale_date FROM units \
         WHERE serial_number = $1 FOR UPDATE",
    )
    .bind(serial_number)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::LifecycleConflict {
        serial_number: serial_number.to_string(),
        reason: TransitionBlock::NotFound,
    })?;

    let custody = Custody::from_str(&row.1)
        .ok_or_else(|| AppError::Internal(format!("Unknown custody state: {}", row.1)))?;

    Ok(LockedUnit {
        unit_id: row.0,
        serial_number: serial_number.to_string(),
        snapshot: CustodySnapshot {
            custody,
            holder_dealer_id: row.2,
            sold: row.3.is_some(),
        },
    })
}

impl OwnershipService {
    /// Create a new OwnershipService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Dispatch a batch of factory-custody units to a main dealer
    pub async fn create_unit_dispatch(
        &self,
        created_by: Uuid,
        input: CreateUnitDispatchInput,
    ) -> AppResult<UnitDispatchView> {
        if input.dispatch_number.trim().is_empty() {
            return Err(AppError::Validation {
                field: "dispatch_number".to_string(),
                message: "Dispatch number is required".to_string(),
            });
        }

        let serials = validate_serial_batch(&input.serial_numbers)?;

        let dealer = sqlx::query_as::<_, (String, Option<Uuid>, bool)>(
            "SELECT name, parent_dealer_id, is_active FROM dealers WHERE id = $1",
        )
        .bind(input.dealer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Dealer".to_string()))?;

        let (dealer_name, parent_dealer_id, is_active) = dealer;

        if parent_dealer_id.is_some() {
            return Err(AppError::Validation {
                field: "dealer_id".to_string(),
                message: "Units can only be dispatched to a main dealer".to_string(),
            });
        }

        if !is_active {
            return Err(AppError::Validation {
                field: "dealer_id".to_string(),
                message: "Dealer is not active".to_string(),
            });
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM unit_dispatches WHERE dispatch_number = $1",
        )
        .bind(&input.dispatch_number)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("dispatch_number".to_string()));
        }

        let mut tx = self.db.begin().await?;

        // Validate the whole batch before any write
        let mut locked = Vec::with_capacity(serials.len());
        for serial in &serials {
            let unit = lock_unit(&mut tx, serial).await?;
            check_dispatchable(&unit.snapshot).map_err(|reason| AppError::LifecycleConflict {
                serial_number: serial.clone(),
                reason,
            })?;
            locked.push(unit);
        }

        let dispatch_row = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO unit_dispatches (dispatch_number, dealer_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, dispatched_at
            "#,
        )
        .bind(&input.dispatch_number)
        .bind(input.dealer_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let (dispatch_id, dispatched_at) = dispatch_row;

        for unit in &locked {
            let updated = sqlx::query(
                r#"
                UPDATE units
                SET custody = 'dealer', holder_dealer_id = $1, dispatch_id = $2, updated_at = NOW()
                WHERE id = $3 AND custody = 'factory' AND sale_date IS NULL
                "#,
            )
            .bind(input.dealer_id)
            .bind(dispatch_id)
            .bind(unit.unit_id)
            .execute(&mut *tx)
            .await?;

            // Rows are locked, so a miss here means the snapshot lied
            if updated.rows_affected() != 1 {
                return Err(AppError::LifecycleConflict {
                    serial_number: unit.serial_number.clone(),
                    reason: TransitionBlock::AlreadyDispatched,
                });
            }

            sqlx::query("INSERT INTO unit_dispatch_items (dispatch_id, unit_id) VALUES ($1, $2)")
                .bind(dispatch_id)
                .bind(unit.unit_id)
                .execute(&mut *tx)
                .await?;

            append_ownership_event(
                &mut tx,
                unit.unit_id,
                OwnershipEventType::Dispatched,
                Some("factory"),
                Some(&dealer_name),
                Some(dispatch_id),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            dispatch_number = %input.dispatch_number,
            dealer_id = %input.dealer_id,
            units = serials.len(),
            "Dispatched units to dealer"
        );

        Ok(UnitDispatchView {
            dispatch: UnitDispatch {
                id: dispatch_id,
                dispatch_number: input.dispatch_number,
                dealer_id: input.dealer_id,
                dispatched_at,
                created_by: Some(created_by),
            },
            dealer_name,
            serial_numbers: serials,
        })
    }

    /// Get a dispatch with the serials it moved
    pub async fn get_unit_dispatch(&self, dispatch_id: Uuid) -> AppResult<UnitDispatchView> {
        let row = sqlx::query_as::<_, (Uuid, String, Uuid, DateTime<Utc>, Option<Uuid>, String)>(
            r#"
            SELECT d.id, d.dispatch_number, d.dealer_id, d.dispatched_at, d.created_by, dl.name
            FROM unit_dispatches d
            JOIN dealers dl ON dl.id = d.dealer_id
            WHERE d.id = $1
            "#,
        )
        .bind(dispatch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Dispatch".to_string()))?;

        let serial_numbers = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.serial_number
            FROM unit_dispatch_items i
            JOIN units u ON u.id = i.unit_id
            WHERE i.dispatch_id = $1
            ORDER BY u.serial_number
            "#,
        )
        .bind(dispatch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(UnitDispatchView {
            dispatch: UnitDispatch {
                id: row.0,
                dispatch_number: row.1,
                dealer_id: row.2,
                dispatched_at: row.3,
                created_by: row.4,
            },
            dealer_name: row.5,
            serial_numbers,
        })
    }

    /// List dispatches, optionally scoped to a dealer
    pub async fn list_unit_dispatches(
        &self,
        dealer_id: Option<Uuid>,
    ) -> AppResult<Vec<UnitDispatchView>> {
        let rows = match dealer_id {
            Some(dealer_id) => {
                sqlx::query_as::<_, (Uuid, String, Uuid, DateTime<Utc>, Option<Uuid>, String)>(
                    r#"
                    SELECT d.id, d.dispatch_number, d.dealer_id, d.dispatched_at, d.created_by, dl.name
                    FROM unit_dispatches d
                    JOIN dealers dl ON dl.id = d.dealer_id
                    WHERE d.dealer_id = $1
                    ORDER BY d.dispatched_at DESC
                    "#,
                )
                .bind(dealer_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, (Uuid, String, Uuid, DateTime<Utc>, Option<Uuid>, String)>(
                    r#"
                    SELECT d.id, d.dispatch_number, d.dealer_id, d.dispatched_at, d.created_by, dl.name
                    FROM unit_dispatches d
                    JOIN dealers dl ON dl.id = d.dealer_id
                    ORDER BY d.dispatched_at DESC
                    "#,
                )
                .fetch_all(&self.db)
                .await?
            }
        };

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let serial_numbers = sqlx::query_scalar::<_, String>(
                r#"
                SELECT u.serial_number
                FROM unit_dispatch_items i
                JOIN units u ON u.id = i.unit_id
                WHERE i.dispatch_id = $1
                ORDER BY u.serial_number
                "#,
            )
            .bind(row.0)
            .fetch_all(&self.db)
            .await?;

            views.push(UnitDispatchView {
                dispatch: UnitDispatch {
                    id: row.0,
                    dispatch_number: row.1,
                    dealer_id: row.2,
                    dispatched_at: row.3,
                    created_by: row.4,
                },
                dealer_name: row.5,
                serial_numbers,
            });
        }

        Ok(views)
    }

    /// Transfer a batch of units from the acting main dealer to one of its
    /// sub-dealers
    pub async fn create_unit_transfer(
        &self,
        acting_dealer_id: Uuid,
        created_by: Uuid,
        input: CreateUnitTransferInput,
    ) -> AppResult<UnitTransferView> {
        let serials = validate_serial_batch(&input.serial_numbers)?;

        let sub_dealer = sqlx::query_as::<_, (String, Option<Uuid>, bool)>(
            "SELECT name, parent_dealer_id, is_active FROM dealers WHERE id = $1",
        )
        .bind(input.sub_dealer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sub-dealer".to_string()))?;

        let (sub_dealer_name, parent_dealer_id, is_active) = sub_dealer;

        if parent_dealer_id != Some(acting_dealer_id) {
            return Err(AppError::Forbidden(
                "Sub-dealer does not belong to the acting dealer".to_string(),
            ));
        }

        if !is_active {
            return Err(AppError::Validation {
                field: "sub_dealer_id".to_string(),
                message: "Sub-dealer is not active".to_string(),
            });
        }

        let dealer_name =
            sqlx::query_scalar::<_, String>("SELECT name FROM dealers WHERE id = $1")
                .bind(acting_dealer_id)
                .fetch_one(&self.db)
                .await?;

        let mut tx = self.db.begin().await?;

        let mut locked = Vec::with_capacity(serials.len());
        for serial in &serials {
            let unit = lock_unit(&mut tx, serial).await?;
            check_transferable(&unit.snapshot, acting_dealer_id).map_err(|reason| {
                AppError::LifecycleConflict {
                    serial_number: serial.clone(),
                    reason,
                }
            })?;
            locked.push(unit);
        }

        let transfer_row = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO unit_transfers (dealer_id, sub_dealer_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, transferred_at
            "#,
        )
        .bind(acting_dealer_id)
        .bind(input.sub_dealer_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let (transfer_id, transferred_at) = transfer_row;

        for unit in &locked {
            let updated = sqlx::query(
                r#"
                UPDATE units
                SET custody = 'sub_dealer', holder_dealer_id = $1, updated_at = NOW()
                WHERE id = $2 AND custody = 'dealer' AND holder_dealer_id = $3
                  AND sale_date IS NULL
                "#,
            )
            .bind(input.sub_dealer_id)
            .bind(unit.unit_id)
            .bind(acting_dealer_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() != 1 {
                return Err(AppError::LifecycleConflict {
                    serial_number: unit.serial_number.clone(),
                    reason: TransitionBlock::NotOwned,
                });
            }

            sqlx::query("INSERT INTO unit_transfer_items (transfer_id, unit_id) VALUES ($1, $2)")
                .bind(transfer_id)
                .bind(unit.unit_id)
                .execute(&mut *tx)
                .await?;

            append_ownership_event(
                &mut tx,
                unit.unit_id,
                OwnershipEventType::Transferred,
                Some(&dealer_name),
                Some(&sub_dealer_name),
                Some(transfer_id),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            dealer_id = %acting_dealer_id,
            sub_dealer_id = %input.sub_dealer_id,
            units = serials.len(),
            "Transferred units to sub-dealer"
        );

        Ok(UnitTransferView {
            transfer: UnitTransfer {
                id: transfer_id,
                dealer_id: acting_dealer_id,
                sub_dealer_id: input.sub_dealer_id,
                transferred_at,
                created_by: Some(created_by),
            },
            sub_dealer_name,
            serial_numbers: serials,
        })
    }

    /// List transfers, optionally scoped to a main dealer
    pub async fn list_unit_transfers(
        &self,
        dealer_id: Option<Uuid>,
    ) -> AppResult<Vec<UnitTransferView>> {
        let rows = match dealer_id {
            Some(dealer_id) => {
                sqlx::query_as::<_, (Uuid, Uuid, Uuid, DateTime<Utc>, Option<Uuid>, String)>(
                    r#"
                    SELECT t.id, t.dealer_id, t.sub_dealer_id, t.transferred_at, t.created_by, sd.name
                    FROM unit_transfers t
                    JOIN dealers sd ON sd.id = t.sub_dealer_id
                    WHERE t.dealer_id = $1
                    ORDER BY t.transferred_at DESC
                    "#,
                )
                .bind(dealer_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, (Uuid, Uuid, Uuid, DateTime<Utc>, Option<Uuid>, String)>(
                    r#"
                    SELECT t.id, t.dealer_id, t.sub_dealer_id, t.transferred_at, t.created_by, sd.name
                    FROM unit_transfers t
                    JOIN dealers sd ON sd.id = t.sub_dealer_id
                    ORDER BY t.transferred_at DESC
                    "#,
                )
                .fetch_all(&self.db)
                .await?
            }
        };

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let serial_numbers = sqlx::query_scalar::<_, String>(
                r#"
                SELECT u.serial_number
                FROM unit_transfer_items i
                JOIN units u ON u.id = i.unit_id
                WHERE i.transfer_id = $1
                ORDER BY u.serial_number
                "#,
            )
            .bind(row.0)
            .fetch_all(&self.db)
            .await?;

            views.push(UnitTransferView {
                transfer: UnitTransfer {
                    id: row.0,
                    dealer_id: row.1,
                    sub_dealer_id: row.2,
                    transferred_at: row.3,
                    created_by: row.4,
                },
                sub_dealer_name: row.5,
                serial_numbers,
            });
        }

        Ok(views)
    }

    /// Record a customer sale of a single unit
    pub async fn record_sale(
        &self,
        seller: Seller,
        created_by: Uuid,
        input: RecordSaleInput,
    ) -> AppResult<Unit> {
        let units = self
            .record_sales_bulk(
                seller,
                created_by,
                RecordSalesBulkInput {
                    serial_numbers: vec![input.serial_number],
                    invoice_no: input.invoice_no,
                    sale_date: input.sale_date,
                    customer_name: input.customer_name,
                    customer_contact: input.customer_contact,
                },
            )
            .await?;

        units
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Sale returned no unit".to_string()))
    }

    /// Sell a batch of units to one customer on one invoice. A sale is
    /// terminal: once the conditional update lands, no further custody
    /// transition exists. Every serial is validated under lock before any
    /// sale column is written; one blocked serial rejects the batch.
    pub async fn record_sales_bulk(
        &self,
        seller: Seller,
        created_by: Uuid,
        input: RecordSalesBulkInput,
    ) -> AppResult<Vec<Unit>> {
        if input.invoice_no.trim().is_empty() {
            return Err(AppError::Validation {
                field: "invoice_no".to_string(),
                message: "Invoice number is required".to_string(),
            });
        }

        if input.customer_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "customer_name".to_string(),
                message: "Customer name is required".to_string(),
            });
        }

        if input.sale_date > Utc::now().date_naive() {
            return Err(AppError::Validation {
                field: "sale_date".to_string(),
                message: "Sale date cannot be in the future".to_string(),
            });
        }

        let serials = validate_serial_batch(&input.serial_numbers)?;

        let mut tx = self.db.begin().await?;

        // Validate the whole batch before any write
        let mut locked = Vec::with_capacity(serials.len());
        for serial in &serials {
            let unit = lock_unit(&mut tx, serial).await?;
            check_sellable(&unit.snapshot, &seller).map_err(|reason| {
                AppError::LifecycleConflict {
                    serial_number: serial.clone(),
                    reason,
                }
            })?;
            locked.push(unit);
        }

        let (sold_by_dealer_id, seller_name) = match seller {
            Seller::Factory => (None, "factory".to_string()),
            Seller::Dealer(dealer_id) => {
                let name =
                    sqlx::query_scalar::<_, String>("SELECT name FROM dealers WHERE id = $1")
                        .bind(dealer_id)
                        .fetch_one(&mut *tx)
                        .await?;
                (Some(dealer_id), name)
            }
        };

        let mut units = Vec::with_capacity(locked.len());
        for unit in &locked {
            let row = sqlx::query_as::<_, UnitRow>(&format!(
                r#"
                UPDATE units
                SET sale_invoice_no = $1, sale_date = $2, customer_name = $3,
                    customer_contact = $4, sold_by_dealer_id = $5, updated_at = NOW()
                WHERE id = $6 AND sale_date IS NULL
                RETURNING {UNIT_COLUMNS}
                "#,
            ))
            .bind(&input.invoice_no)
            .bind(input.sale_date)
            .bind(&input.customer_name)
            .bind(&input.customer_contact)
            .bind(sold_by_dealer_id)
            .bind(unit.unit_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::LifecycleConflict {
                serial_number: unit.serial_number.clone(),
                reason: TransitionBlock::AlreadySold,
            })?;

            let sale_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO unit_sales
                    (unit_id, invoice_no, sale_date, customer_name, customer_contact,
                     sold_by_dealer_id, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(unit.unit_id)
            .bind(&input.invoice_no)
            .bind(input.sale_date)
            .bind(&input.customer_name)
            .bind(&input.customer_contact)
            .bind(sold_by_dealer_id)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

            append_ownership_event(
                &mut tx,
                unit.unit_id,
                OwnershipEventType::Sold,
                Some(&seller_name),
                Some(&input.customer_name),
                Some(sale_id),
            )
            .await?;

            units.push(unit_from_row(row)?);
        }

        tx.commit().await?;

        tracing::info!(
            count = units.len(),
            invoice_no = %input.invoice_no,
            "Recorded customer sale"
        );

        Ok(units)
    }

    /// List sale records, optionally scoped to a selling dealer
    pub async fn list_sales(&self, dealer_id: Option<Uuid>) -> AppResult<Vec<SaleRecord>> {
        type SaleRow = (
            Uuid,
            Uuid,
            String,
            NaiveDate,
            String,
            Option<String>,
            Option<Uuid>,
            Option<Uuid>,
            DateTime<Utc>,
        );

        let rows = match dealer_id {
            Some(dealer_id) => {
                sqlx::query_as::<_, SaleRow>(
                    r#"
                    SELECT id, unit_id, invoice_no, sale_date, customer_name, customer_contact,
                           sold_by_dealer_id, created_by, created_at
                    FROM unit_sales
                    WHERE sold_by_dealer_id = $1
                    ORDER BY sale_date DESC, created_at DESC
                    "#,
                )
                .bind(dealer_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, SaleRow>(
                    r#"
                    SELECT id, unit_id, invoice_no, sale_date, customer_name, customer_contact,
                           sold_by_dealer_id, created_by, created_at
                    FROM unit_sales
                    ORDER BY sale_date DESC, created_at DESC
                    "#,
                )
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| SaleRecord {
                id: row.0,
                unit_id: row.1,
                invoice_no: row.2,
                sale_date: row.3,
                customer_name: row.4,
                customer_contact: row.5,
                sold_by_dealer_id: row.6,
                created_by: row.7,
                created_at: row.8,
            })
            .collect())
    }
}
