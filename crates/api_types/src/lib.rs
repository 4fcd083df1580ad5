use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub username: String,
        pub password: String,
        pub email: String,
        pub full_name: Option<String>,
        pub phone_number: Option<String>,
        pub revolut_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub username: String,
        pub email: String,
        pub full_name: Option<String>,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: String,
        pub name: String,
        pub description: String,
        pub owner_id: String,
        pub member_ids: Vec<String>,
    }

    /// Request body for adding a member to a group.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberAdd {
        pub user_id: String,
    }
}

pub mod bill {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum BillType {
        SplitByMembers,
        SplitByProducts,
    }

    /// One user's share of a charge, in cents.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PayerShare {
        pub user_id: String,
        pub amount_minor: i64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ProductItem {
        pub name: String,
        pub price_minor: i64,
        #[serde(default = "default_quantity")]
        pub quantity: u32,
        #[serde(default)]
        pub assigned_payers: Vec<PayerShare>,
    }

    fn default_quantity() -> u32 {
        1
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillNew {
        pub group_id: String,
        pub name: String,
        pub description: Option<String>,
        pub bill_type: BillType,
        /// Per-member shares; read when `bill_type` is `SPLIT_BY_MEMBERS`.
        #[serde(default)]
        pub payers: Vec<PayerShare>,
        /// Line items; read when `bill_type` is `SPLIT_BY_PRODUCTS`.
        #[serde(default)]
        pub products: Vec<ProductItem>,
        #[serde(default)]
        pub initial_payers: Vec<PayerShare>,
        /// RFC3339 timestamp; server time is used when absent.
        pub date: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillView {
        pub id: Uuid,
        pub group_id: String,
        pub owner_id: String,
        pub name: String,
        pub description: String,
        pub bill_type: BillType,
        pub date: DateTime<FixedOffset>,
        pub payers: Vec<PayerShare>,
        pub products: Vec<ProductItem>,
        pub initial_payers: Vec<PayerShare>,
        pub payment_ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillListResponse {
        pub bills: Vec<BillView>,
    }
}

pub mod payment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum PaymentMethod {
        NotSelected,
        Cash,
        Revolut,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum PaymentStatus {
        NotStarted,
        InProgress,
        Completed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: Uuid,
        /// Absent on reversal records, which outlive their bill.
        pub bill_id: Option<Uuid>,
        pub amount_minor: i64,
        pub payer_id: String,
        pub recipient_id: String,
        pub date: DateTime<FixedOffset>,
        pub method: PaymentMethod,
        pub status: PaymentStatus,
    }

    /// Body for `PATCH /payments/{id}`; absent fields are left unchanged.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentUpdate {
        pub method: Option<PaymentMethod>,
        pub status: Option<PaymentStatus>,
    }

    /// Both directions of the current user's open payments.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentsResponse {
        pub to_pay: Vec<PaymentView>,
        pub to_receive: Vec<PaymentView>,
    }
}
