use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::ExternalId).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::DisplayName).string().null())
                    .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                    .col(ColumnDef::new(Users::TeamId).uuid().null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Create events table
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Events::Name).string().not_null())
                    .col(ColumnDef::new(Events::Date).string().not_null())
                    .col(ColumnDef::new(Events::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Events::Description).string().null())
                    .col(ColumnDef::new(Events::MinSquadSize).integer().not_null())
                    .col(ColumnDef::new(Events::MaxSquadSize).integer().not_null())
                    .col(ColumnDef::new(Events::MinBidIncrement).big_integer().not_null())
                    .col(ColumnDef::new(Events::TimerDuration).integer().not_null())
                    .col(ColumnDef::new(Events::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Events::CreatedBy).uuid().not_null())
                    .to_owned(),
            )
            .await?;

        // Create categories table (legacy price-range columns, collapsed by a
        // follow-up migration)
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Categories::EventId).uuid().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::MinPlayers).integer().not_null())
                    .col(ColumnDef::new(Categories::MaxPlayers).integer().not_null())
                    .col(ColumnDef::new(Categories::BasePriceMin).big_integer().not_null())
                    .col(ColumnDef::new(Categories::BasePriceMax).big_integer().not_null())
                    .col(ColumnDef::new(Categories::Color).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_event_id")
                            .from(Categories::Table, Categories::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create teams table
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Teams::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Teams::EventId).uuid().not_null())
                    .col(ColumnDef::new(Teams::Name).string().not_null())
                    .col(ColumnDef::new(Teams::Budget).big_integer().not_null())
                    .col(ColumnDef::new(Teams::Spent).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Teams::Remaining).big_integer().not_null())
                    .col(ColumnDef::new(Teams::MaxSquadSize).integer().not_null())
                    .col(ColumnDef::new(Teams::PlayersCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Teams::Color).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teams_event_id")
                            .from(Teams::Table, Teams::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create players table
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Players::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Players::EventId).uuid().not_null())
                    .col(ColumnDef::new(Players::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Players::Name).string().not_null())
                    .col(ColumnDef::new(Players::BasePrice).big_integer().not_null())
                    .col(ColumnDef::new(Players::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Players::SoldToTeamId).uuid().null())
                    .col(ColumnDef::new(Players::SoldPrice).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_players_event_id")
                            .from(Players::Table, Players::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_players_category_id")
                            .from(Players::Table, Players::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create auction_states table (one row per event)
        manager
            .create_table(
                Table::create()
                    .table(AuctionStates::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuctionStates::EventId).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AuctionStates::CurrentPlayerId).uuid().null())
                    .col(ColumnDef::new(AuctionStates::CurrentBid).big_integer().null())
                    .col(ColumnDef::new(AuctionStates::CurrentTeamId).uuid().null())
                    .col(ColumnDef::new(AuctionStates::CurrentTeamName).string().null())
                    .col(ColumnDef::new(AuctionStates::TimerStartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(AuctionStates::TimerDuration).integer().not_null())
                    .col(ColumnDef::new(AuctionStates::Status).string_len(20).not_null())
                    .col(ColumnDef::new(AuctionStates::BidHistory).json_binary().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auction_states_event_id")
                            .from(AuctionStates::Table, AuctionStates::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create bids table (append-only audit trail)
        manager
            .create_table(
                Table::create()
                    .table(Bids::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bids::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bids::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(Bids::EventId).uuid().not_null())
                    .col(ColumnDef::new(Bids::TeamId).uuid().not_null())
                    .col(ColumnDef::new(Bids::TeamName).string().not_null())
                    .col(ColumnDef::new(Bids::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Bids::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bids_event_id")
                            .from(Bids::Table, Bids::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(Bids::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AuctionStates::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Teams::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    ExternalId,
    Email,
    DisplayName,
    Role,
    TeamId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    Name,
    Date,
    Status,
    Description,
    MinSquadSize,
    MaxSquadSize,
    MinBidIncrement,
    TimerDuration,
    CreatedAt,
    CreatedBy,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    EventId,
    Name,
    MinPlayers,
    MaxPlayers,
    BasePriceMin,
    BasePriceMax,
    Color,
}

#[derive(DeriveIden)]
enum Teams {
    Table,
    Id,
    EventId,
    Name,
    Budget,
    Spent,
    Remaining,
    MaxSquadSize,
    PlayersCount,
    Color,
}

#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    EventId,
    CategoryId,
    Name,
    BasePrice,
    Status,
    SoldToTeamId,
    SoldPrice,
}

#[derive(DeriveIden)]
enum AuctionStates {
    Table,
    EventId,
    CurrentPlayerId,
    CurrentBid,
    CurrentTeamId,
    CurrentTeamName,
    TimerStartedAt,
    TimerDuration,
    Status,
    BidHistory,
}

#[derive(DeriveIden)]
enum Bids {
    Table,
    Id,
    PlayerId,
    EventId,
    TeamId,
    TeamName,
    Amount,
    CreatedAt,
}
