use crate::filter::StatusFilter;
use crate::ledger::Ledger;
use crate::models::{Product, StatsResponse, StatusSlice};
use crate::status::Status;
use chrono::NaiveDate;

pub fn build_stats_at(today: NaiveDate, products: &[Product], ledger: &Ledger, filter: &StatusFilter) -> StatsResponse {
    StatsResponse {
        today,
        distribution: status_distribution(today, products, filter),
        daily_scores: ledger.entries().collect(),
        total_score: ledger.total_score(),
    }
}

/// Product counts per status among the filtered rows, skipping empty statuses.
pub fn status_distribution(today: NaiveDate, products: &[Product], filter: &StatusFilter) -> Vec<StatusSlice> {
    let rows = filter.apply(products, today);
    Status::ALL
        .into_iter()
        .map(|status| StatusSlice {
            status,
            slug: status.slug(),
            count: rows.iter().filter(|row| row.status == status).count(),
            color: status.color(),
        })
        .filter(|slice| slice.count > 0)
        .collect()
}
