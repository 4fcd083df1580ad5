//! Bill primitives.
//!
//! A `Bill` charges a set of users inside a group. The charges come either as
//! per-member shares (`SplitByMembers`) or as per-product assignments
//! (`SplitByProducts`); `initial_payers` lists who already fronted money
//! toward the bill. Amounts are integer cents.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillType {
    SplitByMembers,
    SplitByProducts,
}

impl BillType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SplitByMembers => "SPLIT_BY_MEMBERS",
            Self::SplitByProducts => "SPLIT_BY_PRODUCTS",
        }
    }
}

impl TryFrom<&str> for BillType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "SPLIT_BY_MEMBERS" => Ok(Self::SplitByMembers),
            "SPLIT_BY_PRODUCTS" => Ok(Self::SplitByProducts),
            other => Err(EngineError::Validation(format!(
                "invalid bill type: {other}"
            ))),
        }
    }
}

/// One user's share of a charge, in cents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub user_id: String,
    pub amount_minor: i64,
}

/// A line item of a product-split bill. Each assigned payer carries their
/// portion of the product's cost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price_minor: i64,
    pub quantity: u32,
    pub assigned_payers: Vec<Payer>,
}

/// Input for [`Engine::create_bill`].
///
/// [`Engine::create_bill`]: crate::Engine::create_bill
#[derive(Clone, Debug)]
pub struct NewBill {
    pub group_id: String,
    pub name: String,
    pub description: String,
    pub bill_type: BillType,
    pub payers: Vec<Payer>,
    pub products: Vec<Product>,
    pub initial_payers: Vec<Payer>,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub group_id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub bill_type: BillType,
    pub date: DateTime<Utc>,
    /// Per-member shares; read when `bill_type` is `SplitByMembers`.
    pub payers: Vec<Payer>,
    /// Line items; read when `bill_type` is `SplitByProducts`.
    pub products: Vec<Product>,
    pub initial_payers: Vec<Payer>,
    pub payment_ids: Vec<Uuid>,
}

impl Bill {
    pub fn new(new: NewBill, owner_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id: new.group_id,
            owner_id,
            name: new.name,
            description: new.description,
            bill_type: new.bill_type,
            date: new.date,
            payers: new.payers,
            products: new.products,
            initial_payers: new.initial_payers,
            payment_ids: Vec::new(),
        }
    }

    /// Every user id the bill references (shares, product assignments and
    /// fronted money). Used to validate group membership before persisting.
    pub fn participant_ids(&self) -> impl Iterator<Item = &str> {
        self.payers
            .iter()
            .chain(self.products.iter().flat_map(|p| p.assigned_payers.iter()))
            .chain(self.initial_payers.iter())
            .map(|payer| payer.user_id.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub bill_type: String,
    pub date: DateTimeUtc,
    pub payers: String,
    pub products: String,
    pub initial_payers: String,
    pub payment_ids: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn encode<T: Serialize>(value: &T) -> Result<String, EngineError> {
    serde_json::to_string(value)
        .map_err(|_| EngineError::Validation("invalid bill payload".to_string()))
}

fn decode<'a, T: Deserialize<'a>>(value: &'a str) -> Result<T, EngineError> {
    serde_json::from_str(value)
        .map_err(|_| EngineError::Validation("invalid bill payload".to_string()))
}

impl TryFrom<&Bill> for ActiveModel {
    type Error = EngineError;

    fn try_from(bill: &Bill) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(bill.id.to_string()),
            group_id: ActiveValue::Set(bill.group_id.clone()),
            owner_id: ActiveValue::Set(bill.owner_id.clone()),
            name: ActiveValue::Set(bill.name.clone()),
            description: ActiveValue::Set(bill.description.clone()),
            bill_type: ActiveValue::Set(bill.bill_type.as_str().to_string()),
            date: ActiveValue::Set(bill.date),
            payers: ActiveValue::Set(encode(&bill.payers)?),
            products: ActiveValue::Set(encode(&bill.products)?),
            initial_payers: ActiveValue::Set(encode(&bill.initial_payers)?),
            payment_ids: ActiveValue::Set(encode(&bill.payment_ids)?),
        })
    }
}

impl TryFrom<Model> for Bill {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("bill not exists".to_string()))?,
            group_id: model.group_id,
            owner_id: model.owner_id,
            name: model.name,
            description: model.description,
            bill_type: BillType::try_from(model.bill_type.as_str())?,
            date: model.date,
            payers: decode(&model.payers)?,
            products: decode(&model.products)?,
            initial_payers: decode(&model.initial_payers)?,
            payment_ids: decode(&model.payment_ids)?,
        })
    }
}
