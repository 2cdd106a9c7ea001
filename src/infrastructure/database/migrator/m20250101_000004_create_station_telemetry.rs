//! Create station_telemetry table

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_stations::Stations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StationTelemetry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StationTelemetry::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StationTelemetry::StationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StationTelemetry::Voltage).double().not_null())
                    .col(ColumnDef::new(StationTelemetry::Current).double().not_null())
                    .col(
                        ColumnDef::new(StationTelemetry::Temperature)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StationTelemetry::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_station_telemetry_station")
                            .from(StationTelemetry::Table, StationTelemetry::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_station_telemetry_station_time")
                    .table(StationTelemetry::Table)
                    .col(StationTelemetry::StationId)
                    .col(StationTelemetry::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StationTelemetry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum StationTelemetry {
    Table,
    Id,
    StationId,
    Voltage,
    Current,
    Temperature,
    Timestamp,
}
