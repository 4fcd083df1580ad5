//! Payment API endpoints

use api_types::payment::{PaymentUpdate, PaymentView, PaymentsResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::EngineError;

fn method_from_wire(value: api_types::payment::PaymentMethod) -> engine::PaymentMethod {
    match value {
        api_types::payment::PaymentMethod::NotSelected => engine::PaymentMethod::NotSelected,
        api_types::payment::PaymentMethod::Cash => engine::PaymentMethod::Cash,
        api_types::payment::PaymentMethod::Revolut => engine::PaymentMethod::Revolut,
    }
}

fn method_to_wire(value: engine::PaymentMethod) -> api_types::payment::PaymentMethod {
    match value {
        engine::PaymentMethod::NotSelected => api_types::payment::PaymentMethod::NotSelected,
        engine::PaymentMethod::Cash => api_types::payment::PaymentMethod::Cash,
        engine::PaymentMethod::Revolut => api_types::payment::PaymentMethod::Revolut,
    }
}

fn status_from_wire(value: api_types::payment::PaymentStatus) -> engine::PaymentStatus {
    match value {
        api_types::payment::PaymentStatus::NotStarted => engine::PaymentStatus::NotStarted,
        api_types::payment::PaymentStatus::InProgress => engine::PaymentStatus::InProgress,
        api_types::payment::PaymentStatus::Completed => engine::PaymentStatus::Completed,
    }
}

fn status_to_wire(value: engine::PaymentStatus) -> api_types::payment::PaymentStatus {
    match value {
        engine::PaymentStatus::NotStarted => api_types::payment::PaymentStatus::NotStarted,
        engine::PaymentStatus::InProgress => api_types::payment::PaymentStatus::InProgress,
        engine::PaymentStatus::Completed => api_types::payment::PaymentStatus::Completed,
    }
}

fn to_view(payment: engine::Payment) -> PaymentView {
    PaymentView {
        id: payment.id,
        bill_id: payment.bill_id,
        amount_minor: payment.amount_minor,
        payer_id: payment.payer_id,
        recipient_id: payment.recipient_id,
        date: payment.date.fixed_offset(),
        method: method_to_wire(payment.method),
        status: status_to_wire(payment.status),
    }
}

/// Both directions of the authenticated user's payments.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<PaymentsResponse>, ServerError> {
    let to_pay = state.engine.payments_owed_by(&user.username).await?;
    let to_receive = state.engine.payments_owed_to(&user.username).await?;

    Ok(Json(PaymentsResponse {
        to_pay: to_pay.into_iter().map(to_view).collect(),
        to_receive: to_receive.into_iter().map(to_view).collect(),
    }))
}

pub async fn list_for_bill(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(bill_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentView>>, ServerError> {
    let bill = state.engine.bill(bill_id).await?;
    let group = state.engine.group(&bill.group_id).await?;
    if !group.is_member(&user.username) {
        return Err(EngineError::KeyNotFound("bill not exists".to_string()).into());
    }

    let payments = state.engine.payments_for_bill(bill_id).await?;
    Ok(Json(payments.into_iter().map(to_view).collect()))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<PaymentUpdate>,
) -> Result<Json<PaymentView>, ServerError> {
    let payment = state
        .engine
        .update_payment(
            payment_id,
            &user.username,
            payload.method.map(method_from_wire),
            payload.status.map(status_from_wire),
        )
        .await?;

    Ok(Json(to_view(payment)))
}
