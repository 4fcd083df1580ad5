//! The users table and the registration endpoint.
//!
//! Authentication is Basic auth against this table; password hashing and
//! token issuance live outside this service.

use api_types::user::{UserNew, UserView};
use axum::{Json, extract::State, http::StatusCode};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{ServerError, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub revolut_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Register a new user. Username and email must be unique.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserNew>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    if Entity::find_by_id(&payload.username)
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(ServerError::Conflict("username already exists".to_string()));
    }

    if Entity::find()
        .filter(Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(ServerError::Conflict("email already exists".to_string()));
    }

    let user = ActiveModel {
        username: ActiveValue::Set(payload.username.clone()),
        password: ActiveValue::Set(payload.password),
        email: ActiveValue::Set(payload.email.clone()),
        full_name: ActiveValue::Set(payload.full_name.clone()),
        phone_number: ActiveValue::Set(payload.phone_number),
        revolut_id: ActiveValue::Set(payload.revolut_id),
    };
    user.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserView {
            username: payload.username,
            email: payload.email,
            full_name: payload.full_name,
        }),
    ))
}
