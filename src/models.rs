use crate::ledger::{Ledger, ScoreEntry};
use crate::status::{classify, Status};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub barcode: String,
    pub expiration_date: NaiveDate,
}

impl Product {
    pub fn status_on(&self, today: NaiveDate) -> Status {
        classify(self.expiration_date, today)
    }
}

/// A product with its derived status and its position in the unfiltered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedProduct {
    pub index: usize,
    pub barcode: String,
    pub expiration_date: NaiveDate,
    pub status: Status,
    pub color: &'static str,
}

impl ClassifiedProduct {
    pub fn new(index: usize, product: &Product, today: NaiveDate) -> Self {
        let status = product.status_on(today);
        Self {
            index,
            barcode: product.barcode.clone(),
            expiration_date: product.expiration_date,
            status,
            color: status.color(),
        }
    }
}

pub fn classify_all(products: &[Product], today: NaiveDate) -> Vec<ClassifiedProduct> {
    products
        .iter()
        .enumerate()
        .map(|(index, product)| ClassifiedProduct::new(index, product, today))
        .collect()
}

/// Everything loaded from disk for one interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub products: Vec<Product>,
    pub ledger: Ledger,
}

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub barcode: Option<String>,
    pub expiration_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddProductForm {
    pub barcode: Option<String>,
    pub expiration_date: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteProductForm {
    pub index: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub status: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub today: NaiveDate,
    pub total: usize,
    pub products: Vec<ClassifiedProduct>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub path: String,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub today: NaiveDate,
    pub awarded_today: bool,
    pub total_score: u64,
    pub history: Vec<ScoreEntry>,
}

#[derive(Debug, Serialize)]
pub struct StatusSlice {
    pub status: Status,
    pub slug: &'static str,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub today: NaiveDate,
    pub distribution: Vec<StatusSlice>,
    pub daily_scores: Vec<ScoreEntry>,
    pub total_score: u64,
}

/// Outcome code carried back to the dashboard after a form post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Added,
    Deleted,
    Exported,
    MissingFields,
    InvalidDate,
    InvalidIndex,
    NothingToExport,
    InvalidFilter,
}

impl Notice {
    pub const ALL: [Notice; 8] = [
        Notice::Added,
        Notice::Deleted,
        Notice::Exported,
        Notice::MissingFields,
        Notice::InvalidDate,
        Notice::InvalidIndex,
        Notice::NothingToExport,
        Notice::InvalidFilter,
    ];

    /// Unknown or blank codes map to no notice at all.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Notice::ALL.into_iter().find(|notice| notice.as_str() == code)
    }

    pub fn is_error(self) -> bool {
        !matches!(self, Notice::Added | Notice::Deleted | Notice::Exported)
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::Added => "Product added.",
            Notice::Deleted => "Product removed.",
            Notice::Exported => "Filtered products exported.",
            Notice::MissingFields => "All fields are required to add a product.",
            Notice::InvalidDate => "Expiration date must be YYYY-MM-DD.",
            Notice::InvalidIndex => "Invalid index or empty table.",
            Notice::NothingToExport => "Nothing to export.",
            Notice::InvalidFilter => "Unknown status filter.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Notice::Added => "added",
            Notice::Deleted => "deleted",
            Notice::Exported => "exported",
            Notice::MissingFields => "missing_fields",
            Notice::InvalidDate => "invalid_date",
            Notice::InvalidIndex => "invalid_index",
            Notice::NothingToExport => "nothing_to_export",
            Notice::InvalidFilter => "invalid_filter",
        }
    }
}
