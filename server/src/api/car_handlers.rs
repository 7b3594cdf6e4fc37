use axum::{extract::State, response::Json};

use crate::inventory;

use super::{
    ApiErr, AppState,
    dto::{CarSummary, CarsResponse},
};

pub async fn get_cars(State(state): State<AppState>) -> Result<Json<CarsResponse>, ApiErr> {
    let cars = inventory::list_cars(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(CarsResponse {
        car_models: cars.into_iter().map(CarSummary::from).collect(),
    }))
}
