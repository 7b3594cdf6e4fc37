use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{entity::app_user, inventory::CarEntry};

// ---------- auth requests ----------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

// ---------- auth responses ----------

pub const AUTHENTICATED: &str = "Authenticated";
pub const ALREADY_REGISTERED: &str = "Already Registered";

/// Flat body of the login/logout/register endpoints.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl AuthResponse {
    pub fn authenticated(user_name: String) -> Self {
        Self {
            user_name,
            status: Some(AUTHENTICATED),
            error: None,
        }
    }

    /// Echo the name back without a status: credentials were not accepted.
    pub fn rejected(user_name: String) -> Self {
        Self {
            user_name,
            status: None,
            error: None,
        }
    }

    pub fn already_registered(user_name: String) -> Self {
        Self {
            user_name,
            status: None,
            error: Some(ALREADY_REGISTERED),
        }
    }

    pub fn logged_out() -> Self {
        Self::rejected(String::new())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<app_user::Model> for CurrentUserResponse {
    fn from(m: app_user::Model) -> Self {
        Self {
            user_name: m.username,
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
        }
    }
}

// ---------- inventory responses ----------

#[derive(Debug, Serialize)]
pub struct CarSummary {
    #[serde(rename = "CarModel")]
    pub model: String,
    #[serde(rename = "CarMake")]
    pub make: String,
}

impl From<CarEntry> for CarSummary {
    fn from(entry: CarEntry) -> Self {
        Self {
            model: entry.model,
            make: entry.make,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CarsResponse {
    #[serde(rename = "CarModels")]
    pub car_models: Vec<CarSummary>,
}

// ---------- status envelope ----------

/// `{"status": <code>, "message": "..."}`, always sent with HTTP 200; the
/// business outcome lives in `status`.
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: u16,
    pub message: String,
}

impl StatusMessage {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request")
    }
}

impl IntoResponse for StatusMessage {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// ---------- dealer responses ----------

#[derive(Debug, Serialize)]
pub struct DealersResponse {
    pub status: u16,
    /// Upstream payload as-is; `null` when the backend could not be reached.
    pub dealers: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct DealerResponse {
    pub status: u16,
    pub dealer: Option<Value>,
}

/// A review as served by the dealer backend, plus the sentiment we attach.
/// Fields we do not interpret are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub review: String,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub sentiment: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// The backend stores free-form documents; a non-string field counts as absent.
fn string_or_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    string_or_none(d).map(Option::unwrap_or_default)
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub status: u16,
    pub reviews: Vec<Review>,
}

// ---------- review submission ----------

/// Body of `POST /review`, forwarded to the backend's `/insert_review`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub name: String,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub dealership: u64,
    pub review: String,
    #[serde(default)]
    pub purchase: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_model: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_number_or_numeric_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub car_year: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

impl NumberOrString {
    fn into_number<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a number, got {s:?}"))),
        }
    }
}

// Browser forms post ids and years as strings.
fn number_or_numeric_string<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    NumberOrString::deserialize(d)?.into_number()
}

fn optional_number_or_numeric_string<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<u64>, D::Error> {
    match Option::<NumberOrString>::deserialize(d)? {
        None => Ok(None),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(raw) => raw.into_number().map(Some),
    }
}
