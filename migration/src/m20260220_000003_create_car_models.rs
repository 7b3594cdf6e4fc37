use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CarModel::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CarModel::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CarModel::CarMakeId).uuid().not_null())
                    .col(ColumnDef::new(CarModel::Name).string().not_null())
                    .col(
                        ColumnDef::new(CarModel::Type)
                            .string()
                            .not_null()
                            .default("SUV"),
                    )
                    .col(ColumnDef::new(CarModel::Year).integer().not_null())
                    .col(
                        ColumnDef::new(CarModel::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_model_make")
                            .from(CarModel::Table, CarModel::CarMakeId)
                            .to(CarMake::Table, CarMake::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_car_model_make_name")
                    .table(CarModel::Table)
                    .col(CarModel::CarMakeId)
                    .col(CarModel::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CarModel::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CarModel {
    Table,
    Id,
    CarMakeId,
    Name,
    Type,
    Year,
    CreatedAt,
}

#[derive(Iden)]
enum CarMake {
    Table,
    Id,
}
