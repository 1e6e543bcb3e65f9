use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: String,
    pub game_id: String,
    pub game_type: String,
    pub lobby_id: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub player_ids: Json,
    pub current_player_id: String,
    pub status: String,
    #[sea_orm(column_type = "Json")]
    pub game_state: Json,
    pub started_at: OffsetDateTime,
    pub ended_at: Option<OffsetDateTime>,
    pub winner_id: Option<String>,
    pub total_moves: i32,
    #[sea_orm(column_type = "Json")]
    pub metadata: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
