//! Payment primitives.
//!
//! A `Payment` records that one user owes another a share of a bill. Payments
//! are created exclusively by the settlement computation at bill-creation
//! time; afterwards only their method/status change, or they are reversed
//! when a bill with completed payments is deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    NotSelected,
    Cash,
    Revolut,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotSelected => "NOT_SELECTED",
            Self::Cash => "CASH",
            Self::Revolut => "REVOLUT",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "NOT_SELECTED" => Ok(Self::NotSelected),
            "CASH" => Ok(Self::Cash),
            "REVOLUT" => Ok(Self::Revolut),
            other => Err(EngineError::Validation(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "NOT_STARTED" => Ok(Self::NotStarted),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(EngineError::Validation(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    /// `None` only on reversal records, which outlive their bill.
    pub bill_id: Option<Uuid>,
    pub amount_minor: i64,
    pub payer_id: String,
    pub recipient_id: String,
    pub date: DateTime<Utc>,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn new(
        bill_id: Option<Uuid>,
        amount_minor: i64,
        payer_id: String,
        recipient_id: String,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bill_id,
            amount_minor,
            payer_id,
            recipient_id,
            date,
            method: PaymentMethod::NotSelected,
            status: PaymentStatus::NotStarted,
        }
    }

    /// Builds the mirror of a completed payment: payer and recipient are
    /// swapped, the bill reference is cleared and method/status start over.
    pub fn reversal(&self, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bill_id: None,
            amount_minor: self.amount_minor,
            payer_id: self.recipient_id.clone(),
            recipient_id: self.payer_id.clone(),
            date: now,
            method: PaymentMethod::NotSelected,
            status: PaymentStatus::NotStarted,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub bill_id: Option<String>,
    pub amount_minor: i64,
    pub payer_id: String,
    pub recipient_id: String,
    pub date: DateTimeUtc,
    pub method: String,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    fn from(payment: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            bill_id: ActiveValue::Set(payment.bill_id.map(|id| id.to_string())),
            amount_minor: ActiveValue::Set(payment.amount_minor),
            payer_id: ActiveValue::Set(payment.payer_id.clone()),
            recipient_id: ActiveValue::Set(payment.recipient_id.clone()),
            date: ActiveValue::Set(payment.date),
            method: ActiveValue::Set(payment.method.as_str().to_string()),
            status: ActiveValue::Set(payment.status.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("payment not exists".to_string()))?,
            bill_id: model.bill_id.and_then(|id| Uuid::parse_str(&id).ok()),
            amount_minor: model.amount_minor,
            payer_id: model.payer_id,
            recipient_id: model.recipient_id,
            date: model.date,
            method: PaymentMethod::try_from(model.method.as_str())?,
            status: PaymentStatus::try_from(model.status.as_str())?,
        })
    }
}
