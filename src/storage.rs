use crate::commands::{Outcome, Transition};
use crate::config::Config;
use crate::errors::AppError;
use crate::ledger::{Ledger, ScoreEntry};
use crate::models::{ClassifiedProduct, Product, Snapshot, classify_all};
use crate::status::Status;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const PRODUCT_HEADER: [&str; 3] = ["Codigo_Barras", "Data_Validade", "Status"];
const LEDGER_HEADER: [&str; 2] = ["Data", "Pontuacao"];

#[derive(Debug, Deserialize)]
struct ProductRecord {
    #[serde(rename = "Codigo_Barras")]
    barcode: String,
    #[serde(rename = "Data_Validade")]
    expiration_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct ProductRow<'a> {
    barcode: &'a str,
    expiration_date: NaiveDate,
    status: Status,
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRecord {
    #[serde(rename = "Data")]
    date: NaiveDate,
    #[serde(rename = "Pontuacao")]
    score: u32,
}

/// CSV-backed tables. Every save rewrites the whole file.
///
/// Nothing guards against another process writing the same files between a
/// load and a save; the last write wins.
#[derive(Debug, Clone)]
pub struct Store {
    products_path: PathBuf,
    ledger_path: PathBuf,
    export_path: PathBuf,
}

impl Store {
    pub fn new(config: &Config) -> Self {
        Self {
            products_path: config.products_path.clone(),
            ledger_path: config.ledger_path.clone(),
            export_path: config.export_path.clone(),
        }
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    pub async fn load(&self) -> Result<Snapshot, AppError> {
        Ok(Snapshot {
            products: self.load_products().await?,
            ledger: self.load_ledger().await?,
        })
    }

    /// Stored `Status` values are ignored; status is derived on every read.
    pub async fn load_products(&self) -> Result<Vec<Product>, AppError> {
        let Some(bytes) = read_or_bootstrap(&self.products_path, &PRODUCT_HEADER).await? else {
            return Ok(Vec::new());
        };
        let records = csv_reader(&bytes)
            .deserialize::<ProductRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records
            .into_iter()
            .map(|record| Product {
                barcode: record.barcode,
                expiration_date: record.expiration_date,
            })
            .collect())
    }

    pub async fn load_ledger(&self) -> Result<Ledger, AppError> {
        let Some(bytes) = read_or_bootstrap(&self.ledger_path, &LEDGER_HEADER).await? else {
            return Ok(Ledger::new());
        };
        let records = csv_reader(&bytes)
            .deserialize::<LedgerRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Ledger::from_entries(records.into_iter().map(|record| ScoreEntry {
            date: record.date,
            score: record.score,
        })))
    }

    pub async fn save_products(&self, products: &[Product], today: NaiveDate) -> Result<(), AppError> {
        let rows = classify_all(products, today);
        write_products(&self.products_path, &rows).await
    }

    pub async fn save_ledger(&self, ledger: &Ledger) -> Result<(), AppError> {
        let mut writer = csv_writer(&LEDGER_HEADER)?;
        for entry in ledger.entries() {
            writer.serialize(LedgerRecord {
                date: entry.date,
                score: entry.score,
            })?;
        }
        write_file(&self.ledger_path, finish(writer)?).await
    }

    pub async fn write_export(&self, rows: &[ClassifiedProduct]) -> Result<(), AppError> {
        write_products(&self.export_path, rows).await?;
        info!(path = %self.export_path.display(), rows = rows.len(), "exported products");
        Ok(())
    }

    /// Persists whatever the transition changed.
    pub async fn commit(&self, transition: &Transition, today: NaiveDate) -> Result<(), AppError> {
        match &transition.outcome {
            Outcome::Added(_) | Outcome::Deleted(_) => {
                self.save_products(&transition.snapshot.products, today).await
            }
            Outcome::Reconciled { .. } if transition.ledger_changed() => {
                self.save_ledger(&transition.snapshot.ledger).await
            }
            Outcome::Reconciled { .. } => Ok(()),
            Outcome::Exported(rows) => self.write_export(rows).await,
        }
    }
}

async fn read_or_bootstrap(path: &Path, header: &[&str]) -> Result<Option<Vec<u8>>, AppError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "data file missing, creating empty table");
            let writer = csv_writer(header)?;
            write_file(path, finish(writer)?).await?;
            Ok(None)
        }
        Err(err) => Err(AppError::internal(err)),
    }
}

async fn write_products(path: &Path, rows: &[ClassifiedProduct]) -> Result<(), AppError> {
    let mut writer = csv_writer(&PRODUCT_HEADER)?;
    for row in rows {
        writer.serialize(ProductRow {
            barcode: &row.barcode,
            expiration_date: row.expiration_date,
            status: row.status,
        })?;
    }
    write_file(path, finish(writer)?).await
}

async fn write_file(path: &Path, payload: Vec<u8>) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, &payload).await?;
    debug!(path = %path.display(), bytes = payload.len(), "wrote table");
    Ok(())
}

fn csv_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes)
}

// Headers are written by hand so an empty table still carries its columns.
fn csv_writer(header: &[&str]) -> Result<csv::Writer<Vec<u8>>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    Ok(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    writer
        .into_inner()
        .map_err(|err| AppError::internal(err.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Command, apply};
    use crate::filter::StatusFilter;

    fn unique_dir(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("expiry_storage_{label}_{}_{nanos}", std::process::id()));
        path
    }

    fn store_in(dir: &Path) -> Store {
        Store::new(&Config {
            port: 0,
            products_path: dir.join("etiquetas.csv"),
            ledger_path: dir.join("pontuacao.csv"),
            export_path: dir.join("produtos_validade.csv"),
        })
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn missing_files_bootstrap_empty_tables() {
        let dir = unique_dir("bootstrap");
        let store = store_in(&dir);

        let snapshot = store.load().await.unwrap();
        assert!(snapshot.products.is_empty());
        assert!(snapshot.ledger.is_empty());

        let products = std::fs::read_to_string(dir.join("etiquetas.csv")).unwrap();
        assert_eq!(products.trim(), "Codigo_Barras,Data_Validade,Status");
        let ledger = std::fs::read_to_string(dir.join("pontuacao.csv")).unwrap();
        assert_eq!(ledger.trim(), "Data,Pontuacao");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn stored_status_is_recomputed_on_load() {
        let dir = unique_dir("status");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("etiquetas.csv"),
            "Codigo_Barras,Data_Validade,Status\n7891000100103,2024-01-09,Within Range\n",
        )
        .unwrap();
        let store = store_in(&dir);

        let products = store.load_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].barcode, "7891000100103");
        assert_eq!(products[0].status_on(day(2024, 1, 10)), Status::Expired);

        store.save_products(&products, day(2024, 1, 10)).await.unwrap();
        let written = std::fs::read_to_string(dir.join("etiquetas.csv")).unwrap();
        assert!(written.contains("7891000100103,2024-01-09,Expired"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn ledger_round_trips_through_csv() {
        let dir = unique_dir("ledger");
        let store = store_in(&dir);
        let ledger = Ledger::from_entries([
            ScoreEntry { date: day(2024, 1, 5), score: 10 },
            ScoreEntry { date: day(2024, 1, 6), score: 0 },
        ]);

        store.save_ledger(&ledger).await.unwrap();
        let text = std::fs::read_to_string(dir.join("pontuacao.csv")).unwrap();
        assert_eq!(text, "Data,Pontuacao\n2024-01-05,10\n2024-01-06,0\n");
        assert_eq!(store.load_ledger().await.unwrap(), ledger);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn corrupt_ledger_is_an_error() {
        let dir = unique_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pontuacao.csv"), "Data,Pontuacao\nyesterday,10\n").unwrap();
        let store = store_in(&dir);

        let err = store.load_ledger().await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn commit_writes_only_what_changed() {
        let dir = unique_dir("commit");
        let store = store_in(&dir);
        let today = day(2024, 1, 10);
        let snapshot = Snapshot {
            products: vec![Product {
                barcode: "42".to_string(),
                expiration_date: day(2024, 1, 20),
            }],
            ledger: Ledger::new(),
        };

        let export = apply(
            &snapshot,
            Command::Export {
                filter: StatusFilter::all(),
                today,
            },
        )
        .unwrap();
        store.commit(&export, today).await.unwrap();

        let exported = std::fs::read_to_string(dir.join("produtos_validade.csv")).unwrap();
        assert_eq!(exported, "Codigo_Barras,Data_Validade,Status\n42,2024-01-20,Within Range\n");
        assert!(!dir.join("etiquetas.csv").exists());
        assert!(!dir.join("pontuacao.csv").exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
