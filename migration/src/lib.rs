pub use sea_orm_migration::prelude::*;

mod m20260219_000001_create_app_users;
mod m20260220_000002_create_car_makes;
mod m20260220_000003_create_car_models;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260219_000001_create_app_users::Migration),
            Box::new(m20260220_000002_create_car_makes::Migration),
            Box::new(m20260220_000003_create_car_models::Migration),
        ]
    }
}
