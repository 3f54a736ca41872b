use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use order_bridge_engine::traits::OrderLedgerError;
use shopify_client::ShopifyApiError;
use thiserror::Error;

use crate::integrations::shopify::OrderConversionError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Order conversion error. {0}")]
    OrderConversionError(#[from] OrderConversionError),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Upstream API error. {0}")]
    UpstreamApiError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OrderConversionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamApiError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderLedgerError> for ServerError {
    fn from(e: OrderLedgerError) -> Self {
        match e {
            OrderLedgerError::ConnectorNotFound(id) => Self::NoRecordFound(format!("Connector {id} not found")),
            OrderLedgerError::DuplicateConnector(_) => Self::InvalidRequestBody(e.to_string()),
            e => Self::BackendError(e.to_string()),
        }
    }
}

impl From<ShopifyApiError> for ServerError {
    fn from(e: ShopifyApiError) -> Self {
        Self::UpstreamApiError(e.to_string())
    }
}
