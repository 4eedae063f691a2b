//! Error types for the trading system.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Top-level trading system error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Position error: {0}")]
    Position(#[from] PositionError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Order sink errors. A failed submission never creates a position.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("Market closed")]
    MarketClosed,
}

/// Market data errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Non-monotonic timestamp for {symbol}: {timestamp} is before {last}")]
    NonMonotonic {
        symbol: String,
        timestamp: NaiveDateTime,
        last: NaiveDateTime,
    },

    #[error("Duplicate bar for {symbol} at {timestamp}")]
    Duplicate {
        symbol: String,
        timestamp: NaiveDateTime,
    },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Position lifecycle errors.
#[derive(Error, Debug)]
pub enum PositionError {
    #[error("Position already open for {0}")]
    AlreadyOpen(String),

    #[error("Invalid quantity {quantity} for {symbol}")]
    InvalidQuantity {
        symbol: String,
        quantity: rust_decimal::Decimal,
    },

    #[error("No open position for {0}")]
    NotFound(String),
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;
