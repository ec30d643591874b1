use crate::commands::{self, Command, NewProduct, Outcome, Transition};
use crate::errors::AppError;
use crate::filter::StatusFilter;
use crate::models::{
    AddProductForm, AddProductRequest, ClassifiedProduct, DeleteProductForm, ExportResponse, FilterQuery, IndexQuery,
    Notice, ProductsResponse, ScoreResponse, Snapshot, StatsResponse,
};
use crate::state::AppState;
use crate::stats::build_stats_at;
use crate::storage::Store;
use crate::ui::{IndexPage, render_index};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    Form, Json,
};
use chrono::{Local, NaiveDate};
use tokio::sync::MutexGuard;
use tracing::info;

/// One interaction: the snapshot loaded under the cycle lock, already reconciled for today.
struct Cycle<'a> {
    _guard: MutexGuard<'a, ()>,
    today: NaiveDate,
    snapshot: Snapshot,
    awarded_today: bool,
}

impl Cycle<'_> {
    async fn commit(&mut self, store: &Store, transition: Transition) -> Result<Outcome, AppError> {
        store.commit(&transition, self.today).await?;
        match &transition.outcome {
            Outcome::Added(product) => {
                info!(barcode = %product.barcode, expiration_date = %product.expiration_date, "product added")
            }
            Outcome::Deleted(product) => info!(barcode = %product.barcode, "product removed"),
            Outcome::Reconciled { .. } | Outcome::Exported(_) => {}
        }
        self.snapshot = transition.snapshot;
        Ok(transition.outcome)
    }
}

async fn open_cycle(state: &AppState) -> Result<Cycle<'_>, AppError> {
    let guard = state.cycle.lock().await;
    let today = today();
    let loaded = state.store.load().await?;
    let transition = commands::apply(&loaded, Command::Reconcile(today))?;
    state.store.commit(&transition, today).await?;

    let awarded_today = matches!(
        transition.outcome,
        Outcome::Reconciled { awarded_today: true, .. }
    );
    if let Outcome::Reconciled { backfilled, .. } = transition.outcome {
        if awarded_today || backfilled > 0 {
            info!(%today, awarded_today, backfilled, "score ledger reconciled");
        }
    }

    Ok(Cycle {
        _guard: guard,
        today,
        snapshot: transition.snapshot,
        awarded_today,
    })
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, AppError> {
    let cycle = open_cycle(&state).await?;
    let (filter, notice) = match StatusFilter::parse(query.status.as_deref()) {
        Ok(filter) => (filter, query.notice.as_deref().and_then(Notice::from_code)),
        Err(_) => (StatusFilter::all(), Some(Notice::InvalidFilter)),
    };

    let rows = filter.apply(&cycle.snapshot.products, cycle.today);
    let page = IndexPage {
        today: cycle.today,
        total_score: cycle.snapshot.ledger.total_score(),
        awarded_today: cycle.awarded_today,
        table_len: cycle.snapshot.products.len(),
        rows: &rows,
        filter: &filter,
        notice,
    };
    Ok(Html(render_index(&page)))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ProductsResponse>, AppError> {
    let filter = StatusFilter::parse(query.status.as_deref())?;
    let cycle = open_cycle(&state).await?;

    Ok(Json(ProductsResponse {
        today: cycle.today,
        total: cycle.snapshot.products.len(),
        products: filter.apply(&cycle.snapshot.products, cycle.today),
    }))
}

pub async fn add_product(
    State(state): State<AppState>,
    Json(payload): Json<AddProductRequest>,
) -> Result<(StatusCode, Json<ClassifiedProduct>), AppError> {
    let new_product = NewProduct::from_fields(payload.barcode.as_deref(), payload.expiration_date.as_deref())?;
    let mut cycle = open_cycle(&state).await?;
    let row = apply_add(&state, &mut cycle, new_product).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn add_product_form(
    State(state): State<AppState>,
    Form(payload): Form<AddProductForm>,
) -> Result<Redirect, AppError> {
    let filter = active_filter(payload.status.as_deref());
    let new_product = match NewProduct::from_fields(payload.barcode.as_deref(), payload.expiration_date.as_deref()) {
        Ok(new_product) => new_product,
        Err(err) => return Ok(notice_redirect(filter.as_ref(), err.notice())),
    };
    let mut cycle = open_cycle(&state).await?;
    apply_add(&state, &mut cycle, new_product).await?;
    Ok(notice_redirect(filter.as_ref(), Notice::Added))
}

async fn apply_add(state: &AppState, cycle: &mut Cycle<'_>, new_product: NewProduct) -> Result<ClassifiedProduct, AppError> {
    let transition = commands::apply(&cycle.snapshot, Command::AddProduct(new_product))?;
    let index = transition.snapshot.products.len() - 1;
    cycle.commit(&state.store, transition).await?;
    Ok(ClassifiedProduct::new(index, &cycle.snapshot.products[index], cycle.today))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ClassifiedProduct>, AppError> {
    let mut cycle = open_cycle(&state).await?;
    let transition = commands::apply(&cycle.snapshot, Command::DeleteProduct(index))?;
    let removed = ClassifiedProduct::new(index, &cycle.snapshot.products[index], cycle.today);
    cycle.commit(&state.store, transition).await?;
    Ok(Json(removed))
}

pub async fn delete_product_form(
    State(state): State<AppState>,
    Form(payload): Form<DeleteProductForm>,
) -> Result<Redirect, AppError> {
    let filter = active_filter(payload.status.as_deref());
    let Some(index) = payload
        .index
        .as_deref()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
    else {
        return Ok(notice_redirect(filter.as_ref(), Notice::InvalidIndex));
    };

    let mut cycle = open_cycle(&state).await?;
    let notice = match commands::apply(&cycle.snapshot, Command::DeleteProduct(index)) {
        Ok(transition) => {
            cycle.commit(&state.store, transition).await?;
            Notice::Deleted
        }
        Err(err) => err.notice(),
    };
    Ok(notice_redirect(filter.as_ref(), notice))
}

pub async fn export(
    State(state): State<AppState>,
    Json(payload): Json<FilterQuery>,
) -> Result<Json<ExportResponse>, AppError> {
    let filter = StatusFilter::parse(payload.status.as_deref())?;
    let mut cycle = open_cycle(&state).await?;
    let command = Command::Export {
        filter,
        today: cycle.today,
    };
    let transition = commands::apply(&cycle.snapshot, command)?;
    let rows = match cycle.commit(&state.store, transition).await? {
        Outcome::Exported(rows) => rows.len(),
        _ => 0,
    };

    Ok(Json(ExportResponse {
        path: state.store.export_path().display().to_string(),
        rows,
    }))
}

pub async fn export_form(
    State(state): State<AppState>,
    Form(payload): Form<FilterQuery>,
) -> Result<Redirect, AppError> {
    let Ok(filter) = StatusFilter::parse(payload.status.as_deref()) else {
        return Ok(notice_redirect(None, Notice::InvalidFilter));
    };
    let mut cycle = open_cycle(&state).await?;
    let command = Command::Export {
        filter: filter.clone(),
        today: cycle.today,
    };
    let notice = match commands::apply(&cycle.snapshot, command) {
        Ok(transition) => {
            cycle.commit(&state.store, transition).await?;
            Notice::Exported
        }
        Err(err) => err.notice(),
    };
    Ok(notice_redirect(Some(&filter), notice))
}

pub async fn get_score(State(state): State<AppState>) -> Result<Json<ScoreResponse>, AppError> {
    let cycle = open_cycle(&state).await?;
    let ledger = &cycle.snapshot.ledger;
    Ok(Json(ScoreResponse {
        today: cycle.today,
        awarded_today: cycle.awarded_today,
        total_score: ledger.total_score(),
        history: ledger.entries().collect(),
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let filter = StatusFilter::parse(query.status.as_deref())?;
    let cycle = open_cycle(&state).await?;
    Ok(Json(build_stats_at(
        cycle.today,
        &cycle.snapshot.products,
        &cycle.snapshot.ledger,
        &filter,
    )))
}

/// The filter a form was posted from. An unreadable one falls back to the full table.
fn active_filter(raw: Option<&str>) -> Option<StatusFilter> {
    StatusFilter::parse(raw).ok()
}

fn notice_redirect(filter: Option<&StatusFilter>, notice: Notice) -> Redirect {
    match filter.filter(|selected| !selected.is_all()) {
        Some(filter) => Redirect::to(&format!("/?status={}&notice={}", filter.to_query(), notice.as_str())),
        None => Redirect::to(&format!("/?notice={}", notice.as_str())),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
