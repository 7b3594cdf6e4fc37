use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CarMake::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CarMake::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Unique so a second concurrent seed fails instead of duplicating makes.
                    .col(
                        ColumnDef::new(CarMake::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CarMake::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CarMake::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CarMake::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CarMake {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
}
