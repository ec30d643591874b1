use crate::models::{ClassifiedProduct, Product, classify_all};
use crate::status::{ParseStatusError, Status};
use chrono::NaiveDate;
use std::collections::BTreeSet;

const NONE: &str = "none";

/// Set of statuses shown in the dashboard table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    statuses: BTreeSet<Status>,
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl StatusFilter {
    pub fn all() -> Self {
        Self {
            statuses: Status::ALL.into_iter().collect(),
        }
    }

    pub fn only(statuses: impl IntoIterator<Item = Status>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            statuses: BTreeSet::new(),
        }
    }

    /// Parses a comma-separated list of slugs or labels.
    ///
    /// Blank selects everything; `none` selects nothing.
    pub fn parse(raw: Option<&str>) -> Result<Self, ParseStatusError> {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(Self::all());
        };
        if raw.eq_ignore_ascii_case(NONE) {
            return Ok(Self::none());
        }

        let statuses = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<Status>)
            .collect::<Result<BTreeSet<_>, _>>()?;

        if statuses.is_empty() {
            return Ok(Self::all());
        }
        Ok(Self { statuses })
    }

    pub fn contains(&self, status: Status) -> bool {
        self.statuses.contains(&status)
    }

    pub fn is_all(&self) -> bool {
        self.statuses.len() == Status::ALL.len()
    }

    pub fn to_query(&self) -> String {
        if self.statuses.is_empty() {
            return NONE.to_string();
        }
        self.statuses
            .iter()
            .map(|status| status.slug())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn apply(&self, products: &[Product], today: NaiveDate) -> Vec<ClassifiedProduct> {
        classify_all(products, today)
            .into_iter()
            .filter(|row| self.contains(row.status))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn product(barcode: &str, offset: i64) -> Product {
        Product {
            barcode: barcode.to_string(),
            expiration_date: today() + Duration::days(offset),
        }
    }

    #[test]
    fn missing_or_blank_selects_everything() {
        assert!(StatusFilter::parse(None).unwrap().is_all());
        assert!(StatusFilter::parse(Some("  ")).unwrap().is_all());
        assert!(StatusFilter::parse(Some(",")).unwrap().is_all());
    }

    #[test]
    fn parses_comma_separated_statuses() {
        let filter = StatusFilter::parse(Some("expired, Within Range")).unwrap();
        assert!(filter.contains(Status::Expired));
        assert!(filter.contains(Status::WithinRange));
        assert!(!filter.contains(Status::NearExpiration));
        assert_eq!(filter.to_query(), "expired,within_range");
    }

    #[test]
    fn none_selects_nothing() {
        let filter = StatusFilter::parse(Some("none")).unwrap();
        assert_eq!(filter, StatusFilter::none());
        assert_eq!(filter.to_query(), "none");
        assert!(filter.apply(&[product("a", 1)], today()).is_empty());
    }

    #[test]
    fn rejects_unknown_status() {
        let err = StatusFilter::parse(Some("expired,rotten")).unwrap_err();
        assert_eq!(err.0, "rotten");
    }

    #[test]
    fn apply_keeps_table_positions() {
        let products = vec![product("a", -2), product("b", 10), product("c", 1)];
        let rows = StatusFilter::only([Status::WithinRange, Status::NearExpiration]).apply(&products, today());

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].index, rows[0].barcode.as_str()), (1, "b"));
        assert_eq!((rows[1].index, rows[1].status), (2, Status::NearExpiration));
    }
}
