use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{catalog::CatalogItem, date::DateKey, store::DishMap};

pub const REROLL_MESSAGE: &str = "Đã random lại món ăn cho hôm nay";

#[derive(Debug, Serialize)]
pub struct DishResponse {
    pub success: bool,
    pub data: CatalogItem,
    pub date: DateKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl DishResponse {
    pub fn new(data: CatalogItem, date: DateKey) -> Self {
        DishResponse {
            success: true,
            data,
            date,
            message: None,
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageResponse {
    pub success: bool,
    pub data: DishMap,
    pub total_dates: usize,
}

impl StorageResponse {
    pub fn new(data: DishMap) -> Self {
        StorageResponse {
            success: true,
            total_dates: data.len(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUpdateResponse {
    pub success: bool,
    pub has_today_dish: bool,
    pub last_updated: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Error body. Still carries a `data` payload so clients can always render something.
#[derive(Debug, Serialize)]
pub struct Failure<T> {
    pub success: bool,
    pub error: &'static str,
    pub data: T,
}

impl<T> Failure<T> {
    pub fn new(error: &'static str, data: T) -> Self {
        Failure {
            success: false,
            error,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Failure<T> {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
