use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum GameSessions {
    Table,
    SessionId,
    GameId,
    GameType,
    LobbyId,
    PlayerIds,
    CurrentPlayerId,
    Status,
    GameState,
    StartedAt,
    EndedAt,
    WinnerId,
    TotalMoves,
    Metadata,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameSessions::SessionId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameSessions::GameId).string().not_null())
                    .col(ColumnDef::new(GameSessions::GameType).string().not_null())
                    .col(ColumnDef::new(GameSessions::LobbyId).string().null())
                    .col(ColumnDef::new(GameSessions::PlayerIds).json().not_null())
                    .col(
                        ColumnDef::new(GameSessions::CurrentPlayerId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GameSessions::Status).string().not_null())
                    .col(ColumnDef::new(GameSessions::GameState).json().not_null())
                    .col(
                        ColumnDef::new(GameSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GameSessions::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(GameSessions::WinnerId).string().null())
                    .col(
                        ColumnDef::new(GameSessions::TotalMoves)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(GameSessions::Metadata).json().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_sessions_game_id")
                    .table(GameSessions::Table)
                    .col(GameSessions::GameId)
                    .to_owned(),
            )
            .await?;

        // Backs the match-history query: status filter ordered by recency.
        manager
            .create_index(
                Index::create()
                    .name("idx_game_sessions_status_started_at")
                    .table(GameSessions::Table)
                    .col(GameSessions::Status)
                    .col(GameSessions::StartedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameSessions::Table).to_owned())
            .await
    }
}
