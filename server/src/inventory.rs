//! Car inventory: the fixed make/model catalogue and the query behind `GET /cars`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{
    car_make,
    car_model::{self, CarType},
};

struct MakeSeed {
    name: &'static str,
    description: &'static str,
    models: [(&'static str, CarType); 3],
}

const SEED_YEAR: i32 = 2023;

const CATALOGUE: [MakeSeed; 5] = [
    MakeSeed {
        name: "NISSAN",
        description: "Great cars. Japanese technology",
        models: [
            ("Pathfinder", CarType::Suv),
            ("Qashqai", CarType::Suv),
            ("XTRAIL", CarType::Suv),
        ],
    },
    MakeSeed {
        name: "Mercedes",
        description: "Great cars. German technology",
        models: [
            ("A-Class", CarType::Suv),
            ("C-Class", CarType::Suv),
            ("E-Class", CarType::Suv),
        ],
    },
    MakeSeed {
        name: "Audi",
        description: "Great cars. German technology",
        models: [
            ("A4", CarType::Suv),
            ("A5", CarType::Suv),
            ("A6", CarType::Suv),
        ],
    },
    MakeSeed {
        name: "Kia",
        description: "Great cars. Korean technology",
        models: [
            ("Sorrento", CarType::Suv),
            ("Carnival", CarType::Suv),
            ("Cerato", CarType::Sedan),
        ],
    },
    MakeSeed {
        name: "Toyota",
        description: "Great cars. Japanese technology",
        models: [
            ("Corolla", CarType::Sedan),
            ("Camry", CarType::Sedan),
            ("Kluger", CarType::Suv),
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { makes: usize, models: usize },
    AlreadySeeded,
}

/// One row of the flattened make/model listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarEntry {
    pub make: String,
    pub model: String,
    pub car_type: CarType,
    pub year: i32,
}

/// Insert the fixed catalogue if the make table is empty.
///
/// Runs in one transaction. Losing a race against a concurrent seed trips the
/// unique make-name constraint and is reported as `AlreadySeeded`.
pub async fn seed(db: &DatabaseConnection) -> Result<SeedOutcome, DbErr> {
    let txn = db.begin().await?;

    if car_make::Entity::find().count(&txn).await? > 0 {
        txn.rollback().await?;
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let now = Utc::now().naive_utc();
    let mut makes = 0;
    let mut models = 0;

    for make in &CATALOGUE {
        let inserted = car_make::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(make.name.to_string()),
            description: Set(make.description.to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await;

        let make_row = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => {
                tracing::info!("inventory seeded concurrently, skipping");
                txn.rollback().await?;
                return Ok(SeedOutcome::AlreadySeeded);
            }
            Err(e) => return Err(e),
        };
        makes += 1;

        for (name, car_type) in make.models {
            car_model::ActiveModel {
                id: Set(Uuid::now_v7()),
                car_make_id: Set(make_row.id),
                name: Set(name.to_string()),
                car_type: Set(car_type),
                year: Set(SEED_YEAR),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            models += 1;
        }
    }

    txn.commit().await?;
    tracing::info!(makes, models, "seeded car inventory");
    Ok(SeedOutcome::Seeded { makes, models })
}

/// Every car model with its make, seeding the catalogue first when empty.
pub async fn list_cars(db: &DatabaseConnection) -> Result<Vec<CarEntry>, DbErr> {
    if car_make::Entity::find().count(db).await? == 0 {
        seed(db).await?;
    }

    let rows = car_model::Entity::find()
        .find_also_related(car_make::Entity)
        .order_by_asc(car_make::Column::Name)
        .order_by_asc(car_model::Column::Name)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(model, make)| {
            make.map(|make| CarEntry {
                make: make.name,
                model: model.name,
                car_type: model.car_type,
                year: model.year,
            })
        })
        .collect())
}

fn is_unique_violation(e: &DbErr) -> bool {
    let msg = e.to_string();
    msg.contains("UNIQUE") || msg.contains("unique")
}
