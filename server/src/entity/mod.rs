pub mod app_user;
pub mod car_make;
pub mod car_model;
