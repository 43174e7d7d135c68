use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

use crate::payments::dto::{CreatePaymentRequest, UpdatePaymentRequest};

/// Payment record. Rows are never physically removed; deactivation flips
/// `active` and everything else stays for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub paid_on: Date,
    pub amount: Decimal, // NUMERIC(10,2), exact
    pub method: String,
    pub description: Option<String>,
    pub location: String,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

/// Audit entry: who deactivated which payment, and when.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeletedPayment {
    pub id: i64,
    pub payment_id: i64,
    pub deleted_by: i64,
    pub deleted_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotModified,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivateOutcome {
    Deactivated,
    NotFound,
}

impl Payment {
    pub async fn create(db: &PgPool, fields: &CreatePaymentRequest) -> anyhow::Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (user_id, paid_on, amount, method, description, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, paid_on, amount, method, description, location,
                      active, created_at, deleted_at
            "#,
        )
        .bind(fields.user_id)
        .bind(fields.paid_on)
        .bind(fields.amount)
        .bind(&fields.method)
        .bind(&fields.description)
        .bind(&fields.location)
        .fetch_one(db)
        .await?;
        Ok(payment)
    }

    /// Active payments for one user. Deactivated rows are invisible here.
    pub async fn list_active(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, paid_on, amount, method, description, location,
                   active, created_at, deleted_at
            FROM payments
            WHERE user_id = $1 AND active
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, paid_on, amount, method, description, location,
                   active, created_at, deleted_at
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(payment)
    }

    /// Partial update of the editable fields. The guard clause makes a
    /// value-identical update touch zero rows, which is reported as
    /// `NotModified` rather than success.
    pub async fn update_fields(
        db: &PgPool,
        id: i64,
        changes: &UpdatePaymentRequest,
    ) -> anyhow::Result<UpdateOutcome> {
        if Self::find_by_id(db, id).await?.is_none() {
            return Ok(UpdateOutcome::NotFound);
        }

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET paid_on     = COALESCE($2, paid_on),
                amount      = COALESCE($3, amount),
                method      = COALESCE($4, method),
                description = COALESCE($5, description),
                location    = COALESCE($6, location)
            WHERE id = $1
              AND (paid_on, amount, method, description, location)
                  IS DISTINCT FROM
                  (COALESCE($2, paid_on), COALESCE($3, amount), COALESCE($4, method),
                   COALESCE($5, description), COALESCE($6, location))
            "#,
        )
        .bind(id)
        .bind(changes.paid_on)
        .bind(changes.amount)
        .bind(&changes.method)
        .bind(&changes.description)
        .bind(&changes.location)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            Ok(UpdateOutcome::NotModified)
        } else {
            Ok(UpdateOutcome::Updated)
        }
    }

    /// Soft delete. The audit row is written first; if that insert fails the
    /// flag flip never runs and the whole operation errors. Two independent
    /// writes, no cross-write transaction. An already-inactive payment can be
    /// deactivated again and gets another audit row.
    pub async fn deactivate(
        db: &PgPool,
        id: i64,
        actor_user_id: i64,
    ) -> anyhow::Result<DeactivateOutcome> {
        let Some(payment) = Self::find_by_id(db, id).await? else {
            return Ok(DeactivateOutcome::NotFound);
        };

        DeletedPayment::record(db, payment.id, actor_user_id).await?;

        sqlx::query("UPDATE payments SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(DeactivateOutcome::Deactivated)
    }
}

impl DeletedPayment {
    pub async fn record(
        db: &PgPool,
        payment_id: i64,
        deleted_by: i64,
    ) -> anyhow::Result<DeletedPayment> {
        let entry = sqlx::query_as::<_, DeletedPayment>(
            r#"
            INSERT INTO deleted_payments (payment_id, deleted_by)
            VALUES ($1, $2)
            RETURNING id, payment_id, deleted_by, deleted_at
            "#,
        )
        .bind(payment_id)
        .bind(deleted_by)
        .fetch_one(db)
        .await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_json_keeps_two_decimal_places() {
        let payment = Payment {
            id: 1,
            user_id: 1,
            paid_on: time::macros::date!(2024 - 10 - 01),
            amount: Decimal::new(10000, 2),
            method: "card".into(),
            description: None,
            location: "x".into(),
            active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            deleted_at: None,
        };
        let json = serde_json::to_string(&payment).unwrap();
        assert!(json.contains("\"100.00\""), "{json}");
        assert!(json.contains("\"active\":true"));
    }
}
