//! Bill API endpoints

use api_types::bill::{BillListResponse, BillNew, BillView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::EngineError;

fn bill_type_from_wire(value: api_types::bill::BillType) -> engine::BillType {
    match value {
        api_types::bill::BillType::SplitByMembers => engine::BillType::SplitByMembers,
        api_types::bill::BillType::SplitByProducts => engine::BillType::SplitByProducts,
    }
}

fn bill_type_to_wire(value: engine::BillType) -> api_types::bill::BillType {
    match value {
        engine::BillType::SplitByMembers => api_types::bill::BillType::SplitByMembers,
        engine::BillType::SplitByProducts => api_types::bill::BillType::SplitByProducts,
    }
}

fn payer_from_wire(share: api_types::bill::PayerShare) -> engine::Payer {
    engine::Payer {
        user_id: share.user_id,
        amount_minor: share.amount_minor,
    }
}

fn payer_to_wire(payer: engine::Payer) -> api_types::bill::PayerShare {
    api_types::bill::PayerShare {
        user_id: payer.user_id,
        amount_minor: payer.amount_minor,
    }
}

fn product_from_wire(item: api_types::bill::ProductItem) -> engine::Product {
    engine::Product {
        name: item.name,
        price_minor: item.price_minor,
        quantity: item.quantity,
        assigned_payers: item.assigned_payers.into_iter().map(payer_from_wire).collect(),
    }
}

fn product_to_wire(product: engine::Product) -> api_types::bill::ProductItem {
    api_types::bill::ProductItem {
        name: product.name,
        price_minor: product.price_minor,
        quantity: product.quantity,
        assigned_payers: product.assigned_payers.into_iter().map(payer_to_wire).collect(),
    }
}

fn to_view(bill: engine::Bill) -> BillView {
    BillView {
        id: bill.id,
        group_id: bill.group_id,
        owner_id: bill.owner_id,
        name: bill.name,
        description: bill.description,
        bill_type: bill_type_to_wire(bill.bill_type),
        date: bill.date.fixed_offset(),
        payers: bill.payers.into_iter().map(payer_to_wire).collect(),
        products: bill.products.into_iter().map(product_to_wire).collect(),
        initial_payers: bill.initial_payers.into_iter().map(payer_to_wire).collect(),
        payment_ids: bill.payment_ids,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BillNew>,
) -> Result<(StatusCode, Json<BillView>), ServerError> {
    let now = Utc::now();
    let new = engine::NewBill {
        group_id: payload.group_id,
        name: payload.name,
        description: payload.description.unwrap_or_default(),
        bill_type: bill_type_from_wire(payload.bill_type),
        payers: payload.payers.into_iter().map(payer_from_wire).collect(),
        products: payload.products.into_iter().map(product_from_wire).collect(),
        initial_payers: payload
            .initial_payers
            .into_iter()
            .map(payer_from_wire)
            .collect(),
        date: payload.date.map(|date| date.to_utc()).unwrap_or(now),
    };

    let bill = state.engine.create_bill(new, &user.username, now).await?;
    Ok((StatusCode::CREATED, Json(to_view(bill))))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(bill_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_bill(bill_id, &user.username, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_for_group(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<BillListResponse>, ServerError> {
    let group = state.engine.group(&group_id).await?;
    if !group.is_member(&user.username) {
        return Err(EngineError::KeyNotFound("group not exists".to_string()).into());
    }

    let bills = state.engine.bills_for_group(&group_id).await?;
    Ok(Json(BillListResponse {
        bills: bills.into_iter().map(to_view).collect(),
    }))
}
