//! Core domain types for the real-time report notification layer.
//!
//! This crate contains shared types used across all packages:
//! - ReportKind, DateRange and GroupKey for addressing report groups
//! - ReportPayload row types for the four report views
//! - ClientEvent and HubCommand for the hub wire protocol
//! - RealtimeConfig for the client session manager

mod config;
mod events;
mod report;

pub use config::RealtimeConfig;
pub use events::{ClientEvent, ClientId, HubCommand, StockAlert, TransactionNotice};
pub use report::{
    CoreError, DataType, DateRange, DepartmentalSalesRow, EmployeePerformanceRow, GroupKey,
    HourlySalesRow, PaymentMethodRow, ReportKind, ReportPayload,
};
