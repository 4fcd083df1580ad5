//! Bill-splitting domain engine.
//!
//! The engine owns the data model (groups, bills, payments), the settlement
//! computation ([`settlement::compute_payments`]) and the storage-backed
//! operations around it. It knows nothing about HTTP; the server crate maps
//! its errors onto responses.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseConnection, QueryFilter, QueryOrder, prelude::*,
};
use uuid::Uuid;

pub use bills::{Bill, BillType, NewBill, Payer, Product};
pub use error::EngineError;
pub use groups::Group;
pub use payments::{Payment, PaymentMethod, PaymentStatus};

mod bills;
mod error;
mod groups;
mod payments;
pub mod settlement;

type ResultEngine<T> = Result<T, EngineError>;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Create a new group owned by `owner_id`. Group names are unique; the
    /// owner is always the first member.
    pub async fn new_group(
        &self,
        name: &str,
        description: &str,
        owner_id: &str,
    ) -> ResultEngine<Group> {
        let existing = groups::Entity::find()
            .filter(groups::Column::Name.eq(name))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }

        let group = Group::new(
            name.to_string(),
            description.to_string(),
            owner_id.to_string(),
        );
        groups::ActiveModel::try_from(&group)?
            .insert(&self.database)
            .await?;
        Ok(group)
    }

    /// Return a group by id.
    pub async fn group(&self, group_id: &str) -> ResultEngine<Group> {
        let model = groups::Entity::find_by_id(group_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        Group::try_from(model)
    }

    /// Add a member to a group. Only the owner can manage members.
    pub async fn add_group_member(
        &self,
        group_id: &str,
        member_id: &str,
        acting_user_id: &str,
    ) -> ResultEngine<Group> {
        let mut group = self.group(group_id).await?;
        if group.owner_id != acting_user_id {
            return Err(EngineError::Forbidden(
                "only the owner can manage members".to_string(),
            ));
        }
        if group.is_member(member_id) {
            return Err(EngineError::ExistingKey(member_id.to_string()));
        }

        group.member_ids.push(member_id.to_string());
        let model = groups::ActiveModel {
            id: ActiveValue::Set(group.id.clone()),
            member_ids: ActiveValue::Set(groups::encode_members(&group.member_ids)?),
            ..Default::default()
        };
        model.update(&self.database).await?;
        Ok(group)
    }

    /// Create a bill and settle it.
    ///
    /// Persisting is two-phase: the bill row is inserted first, the computed
    /// payments are batch-inserted referencing it, then the bill row is
    /// updated with the payment ids. A settlement validation failure aborts
    /// before any payment is persisted and leaves the bill row behind without
    /// payment references; callers surface that as a client error. Storage
    /// failures at any point surface as [`EngineError::Database`] with the
    /// same degraded-state caveat, there is no compensating rollback.
    pub async fn create_bill(
        &self,
        new: NewBill,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Bill> {
        let group = self.group(&new.group_id).await?;
        let mut bill = Bill::new(new, owner_id.to_string());
        for participant in bill.participant_ids() {
            if !group.is_member(participant) {
                return Err(EngineError::KeyNotFound(format!(
                    "member not exists: {participant}"
                )));
            }
        }

        bills::ActiveModel::try_from(&bill)?
            .insert(&self.database)
            .await?;

        let payments = settlement::compute_payments(&bill, now)?;
        if !payments.is_empty() {
            payments::Entity::insert_many(payments.iter().map(payments::ActiveModel::from))
                .exec(&self.database)
                .await?;

            bill.payment_ids = payments.iter().map(|payment| payment.id).collect();
            bills::ActiveModel::try_from(&bill)?
                .update(&self.database)
                .await?;
        }

        Ok(bill)
    }

    /// Return a bill by id.
    pub async fn bill(&self, bill_id: Uuid) -> ResultEngine<Bill> {
        let model = bills::Entity::find_by_id(bill_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("bill not exists".to_string()))?;
        Bill::try_from(model)
    }

    /// List a group's bills, newest first.
    pub async fn bills_for_group(&self, group_id: &str) -> ResultEngine<Vec<Bill>> {
        // Existence check so an unknown group is a 404, not an empty list.
        self.group(group_id).await?;

        let models = bills::Entity::find()
            .filter(bills::Column::GroupId.eq(group_id))
            .order_by_desc(bills::Column::Date)
            .all(&self.database)
            .await?;

        models.into_iter().map(Bill::try_from).collect()
    }

    /// Delete a bill, reversing money that already moved.
    ///
    /// Every associated payment in `Completed` status spawns a mirrored
    /// reversal record (payer and recipient swapped, detached from the bill)
    /// before being removed; payments that never completed are removed
    /// outright.
    pub async fn delete_bill(
        &self,
        bill_id: Uuid,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let bill = self.bill(bill_id).await?;
        if bill.owner_id != user_id {
            return Err(EngineError::Forbidden(
                "you are not the owner of the bill".to_string(),
            ));
        }

        let payment_ids: Vec<String> = bill.payment_ids.iter().map(Uuid::to_string).collect();
        let payment_models = payments::Entity::find()
            .filter(payments::Column::Id.is_in(payment_ids))
            .all(&self.database)
            .await?;

        for model in payment_models {
            let payment = Payment::try_from(model)?;
            if payment.status == PaymentStatus::Completed {
                payments::ActiveModel::from(&payment.reversal(now))
                    .insert(&self.database)
                    .await?;
            }
            payments::Entity::delete_by_id(payment.id.to_string())
                .exec(&self.database)
                .await?;
        }

        bills::Entity::delete_by_id(bill_id.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Return the payments generated for a bill, in generation order.
    pub async fn payments_for_bill(&self, bill_id: Uuid) -> ResultEngine<Vec<Payment>> {
        let bill = self.bill(bill_id).await?;
        let mut payments = Vec::with_capacity(bill.payment_ids.len());
        for payment_id in &bill.payment_ids {
            let model = payments::Entity::find_by_id(payment_id.to_string())
                .one(&self.database)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("payment not exists".to_string()))?;
            payments.push(Payment::try_from(model)?);
        }
        Ok(payments)
    }

    /// Payments where `user_id` owes money, newest first.
    pub async fn payments_owed_by(&self, user_id: &str) -> ResultEngine<Vec<Payment>> {
        let models = payments::Entity::find()
            .filter(payments::Column::PayerId.eq(user_id))
            .order_by_desc(payments::Column::Date)
            .all(&self.database)
            .await?;
        models.into_iter().map(Payment::try_from).collect()
    }

    /// Payments where `user_id` is owed money, newest first.
    pub async fn payments_owed_to(&self, user_id: &str) -> ResultEngine<Vec<Payment>> {
        let models = payments::Entity::find()
            .filter(payments::Column::RecipientId.eq(user_id))
            .order_by_desc(payments::Column::Date)
            .all(&self.database)
            .await?;
        models.into_iter().map(Payment::try_from).collect()
    }

    /// Update a payment's method and/or status. Only the payer or the
    /// recipient of the payment may touch it.
    pub async fn update_payment(
        &self,
        payment_id: Uuid,
        user_id: &str,
        method: Option<PaymentMethod>,
        status: Option<PaymentStatus>,
    ) -> ResultEngine<Payment> {
        let model = payments::Entity::find_by_id(payment_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("payment not exists".to_string()))?;
        let mut payment = Payment::try_from(model)?;

        if payment.payer_id != user_id && payment.recipient_id != user_id {
            return Err(EngineError::Forbidden(
                "you are not part of the payment".to_string(),
            ));
        }

        if let Some(method) = method {
            payment.method = method;
        }
        if let Some(status) = status {
            payment.status = status;
        }

        let update = payments::ActiveModel {
            id: ActiveValue::Set(payment.id.to_string()),
            method: ActiveValue::Set(payment.method.as_str().to_string()),
            status: ActiveValue::Set(payment.status.as_str().to_string()),
            ..Default::default()
        };
        update.update(&self.database).await?;
        Ok(payment)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
