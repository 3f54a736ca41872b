use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl ShopifyApiError {
    /// True when the upstream answered with a non-success HTTP status (as opposed to the request
    /// never completing or the body being malformed).
    pub fn is_query_error(&self) -> bool {
        matches!(self, ShopifyApiError::QueryError { .. })
    }
}
