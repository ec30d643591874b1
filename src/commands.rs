use crate::filter::StatusFilter;
use crate::ledger::reconcile;
use crate::models::{ClassifiedProduct, Notice, Product, Snapshot};
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub barcode: String,
    pub expiration_date: NaiveDate,
}

impl NewProduct {
    /// Validates raw form fields. Both are required; the date must be `YYYY-MM-DD`.
    pub fn from_fields(barcode: Option<&str>, expiration_date: Option<&str>) -> Result<Self, CommandError> {
        let barcode = barcode.map(str::trim).filter(|value| !value.is_empty());
        let expiration_date = expiration_date.map(str::trim).filter(|value| !value.is_empty());
        let (Some(barcode), Some(expiration_date)) = (barcode, expiration_date) else {
            return Err(CommandError::MissingFields);
        };

        let expiration_date = NaiveDate::parse_from_str(expiration_date, "%Y-%m-%d")
            .map_err(|_| CommandError::InvalidDate(expiration_date.to_string()))?;

        Ok(Self {
            barcode: barcode.to_string(),
            expiration_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddProduct(NewProduct),
    DeleteProduct(usize),
    Reconcile(NaiveDate),
    Export { filter: StatusFilter, today: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(Product),
    Deleted(Product),
    Reconciled { awarded_today: bool, backfilled: usize },
    Exported(Vec<ClassifiedProduct>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub snapshot: Snapshot,
    pub outcome: Outcome,
}

impl Transition {
    pub fn products_changed(&self) -> bool {
        matches!(self.outcome, Outcome::Added(_) | Outcome::Deleted(_))
    }

    pub fn ledger_changed(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Reconciled { awarded_today, backfilled } if awarded_today || backfilled > 0
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    MissingFields,
    InvalidDate(String),
    InvalidIndex { index: usize, len: usize },
    NothingToExport,
}

impl CommandError {
    pub fn notice(&self) -> Notice {
        match self {
            CommandError::MissingFields => Notice::MissingFields,
            CommandError::InvalidDate(_) => Notice::InvalidDate,
            CommandError::InvalidIndex { .. } => Notice::InvalidIndex,
            CommandError::NothingToExport => Notice::NothingToExport,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::MissingFields => write!(f, "all fields are required"),
            CommandError::InvalidDate(raw) => write!(f, "expiration date must be YYYY-MM-DD, got '{raw}'"),
            CommandError::InvalidIndex { index, len } => {
                write!(f, "invalid index or empty table (index {index}, {len} rows)")
            }
            CommandError::NothingToExport => write!(f, "nothing to export"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Applies one command to a loaded snapshot. Rejected commands leave nothing changed.
pub fn apply(snapshot: &Snapshot, command: Command) -> Result<Transition, CommandError> {
    match command {
        Command::AddProduct(new_product) => {
            let product = Product {
                barcode: new_product.barcode,
                expiration_date: new_product.expiration_date,
            };
            let mut next = snapshot.clone();
            next.products.push(product.clone());
            Ok(Transition {
                snapshot: next,
                outcome: Outcome::Added(product),
            })
        }
        Command::DeleteProduct(index) => {
            let len = snapshot.products.len();
            if index >= len {
                return Err(CommandError::InvalidIndex { index, len });
            }
            let mut next = snapshot.clone();
            let removed = next.products.remove(index);
            Ok(Transition {
                snapshot: next,
                outcome: Outcome::Deleted(removed),
            })
        }
        Command::Reconcile(today) => {
            let result = reconcile(&snapshot.ledger, today);
            Ok(Transition {
                snapshot: Snapshot {
                    products: snapshot.products.clone(),
                    ledger: result.ledger,
                },
                outcome: Outcome::Reconciled {
                    awarded_today: result.awarded_today,
                    backfilled: result.backfilled,
                },
            })
        }
        Command::Export { filter, today } => {
            let rows = filter.apply(&snapshot.products, today);
            if rows.is_empty() {
                return Err(CommandError::NothingToExport);
            }
            Ok(Transition {
                snapshot: snapshot.clone(),
                outcome: Outcome::Exported(rows),
            })
        }
    }
}
