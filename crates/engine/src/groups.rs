//! Group primitives.
//!
//! A `Group` is the container bills belong to. Its member list is the set of
//! users a bill inside the group may charge.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub member_ids: Vec<String>,
}

impl Group {
    /// Creates a group owned by `owner_id`. The owner is always a member.
    pub fn new(name: String, description: String, owner_id: String) -> Self {
        let member_ids = vec![owner_id.clone()];
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            owner_id,
            member_ids,
        }
    }

    /// Returns `true` if `user_id` is a member of the group.
    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == user_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub member_ids: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bills::Entity")]
    Bills,
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Group> for ActiveModel {
    type Error = EngineError;

    fn try_from(group: &Group) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(group.id.clone()),
            name: ActiveValue::Set(group.name.clone()),
            description: ActiveValue::Set(group.description.clone()),
            owner_id: ActiveValue::Set(group.owner_id.clone()),
            member_ids: ActiveValue::Set(encode_members(&group.member_ids)?),
        })
    }
}

impl TryFrom<Model> for Group {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            owner_id: model.owner_id,
            member_ids: serde_json::from_str(&model.member_ids)
                .map_err(|_| EngineError::Validation("invalid member list".to_string()))?,
        })
    }
}

pub(crate) fn encode_members(member_ids: &[String]) -> Result<String, EngineError> {
    serde_json::to_string(member_ids)
        .map_err(|_| EngineError::Validation("invalid member list".to_string()))
}
