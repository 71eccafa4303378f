//! Report addressing types: kinds, date ranges and group keys.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Errors from parsing report addresses.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown report kind: {0}")]
    InvalidReportKind(String),

    #[error("Malformed group key: {0}")]
    InvalidGroupKey(String),
}

/// The closed set of report views the hub can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Sales totals broken down by department.
    Departmental,
    /// Hourly sales trends across the day.
    Hourly,
    /// Per-employee performance figures.
    Employee,
    /// Payment method analysis.
    Payment,
}

impl ReportKind {
    /// Parse a report kind from its wire name, case-insensitively.
    ///
    /// Kind names are normalized to lowercase everywhere, including the
    /// group-key text, so callers spelling the kind differently still
    /// address the same group.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "departmental" => Some(Self::Departmental),
            "hourly" => Some(Self::Hourly),
            "employee" => Some(Self::Employee),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }

    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Departmental => "departmental",
            Self::Hourly => "hourly",
            Self::Employee => "employee",
            Self::Payment => "payment",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-type qualifier for a report (e.g. "Net", "Gross").
///
/// Open string set; casing is preserved since it is part of the address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(pub String);

impl DataType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self("Net".to_string())
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Inclusive date range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }
}

/// Composite address for a set of clients interested in the same report.
///
/// Structural equality; the sole addressing mechanism for push targeting.
/// Wire text is `{kind}_{from:yyyyMMdd}_{to:yyyyMMdd}_{dataType}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub kind: ReportKind,
    pub range: DateRange,
    pub data_type: DataType,
}

impl GroupKey {
    pub fn new(kind: ReportKind, range: DateRange, data_type: DataType) -> Self {
        Self {
            kind,
            range,
            data_type,
        }
    }

    /// Parse a group key from its wire text.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let mut parts = s.splitn(4, '_');
        let (kind, from, to, data_type) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(k), Some(f), Some(t), Some(d)) => (k, f, t, d),
            _ => return Err(CoreError::InvalidGroupKey(s.to_string())),
        };

        let kind =
            ReportKind::parse(kind).ok_or_else(|| CoreError::InvalidReportKind(kind.to_string()))?;
        let from = NaiveDate::parse_from_str(from, "%Y%m%d")
            .map_err(|_| CoreError::InvalidGroupKey(s.to_string()))?;
        let to = NaiveDate::parse_from_str(to, "%Y%m%d")
            .map_err(|_| CoreError::InvalidGroupKey(s.to_string()))?;

        Ok(Self {
            kind,
            range: DateRange::new(from, to),
            data_type: DataType::new(data_type),
        })
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.kind,
            self.range.from.format("%Y%m%d"),
            self.range.to.format("%Y%m%d"),
            self.data_type
        )
    }
}

/// One row of the departmental sales report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentalSalesRow {
    pub department_id: i64,
    pub department: String,
    pub average: f64,
    pub total_sales: f64,
    pub items: u64,
}

/// One row of the hourly sales trend report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySalesRow {
    /// Hour of day, 0-23.
    pub hour: u8,
    pub total_sales: f64,
    pub transactions: u64,
}

/// One row of the employee performance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePerformanceRow {
    pub employee_id: i64,
    pub employee: String,
    pub total_sales: f64,
    pub transactions: u64,
    pub average_sale: f64,
}

/// One row of the payment method analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodRow {
    pub method: String,
    pub total_amount: f64,
    pub transactions: u64,
    pub share_percent: f64,
}

/// Computed report data as returned by the report data provider.
///
/// The variant is keyed by report kind; the row shapes are owned by the
/// external provider and treated as opaque beyond serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum ReportPayload {
    Departmental { rows: Vec<DepartmentalSalesRow> },
    Hourly { rows: Vec<HourlySalesRow> },
    Employee { rows: Vec<EmployeePerformanceRow> },
    Payment { rows: Vec<PaymentMethodRow> },
}

impl ReportPayload {
    /// The report kind this payload belongs to.
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Departmental { .. } => ReportKind::Departmental,
            Self::Hourly { .. } => ReportKind::Hourly,
            Self::Employee { .. } => ReportKind::Employee,
            Self::Payment { .. } => ReportKind::Payment,
        }
    }
}
