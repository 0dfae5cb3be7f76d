//! # Query Pipeline
//!
//! search → sort → paginate → shape over any [`QuerySource`].
//!
//! All validation happens while planning, before the store is touched. The
//! count and the page fetch share the same search filter. Each store call
//! races the caller's cancellation token; a cancelled query is dropped
//! mid-flight and returns no partial page.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::observability::{Event, Logger, MetricsRegistry, Timer};

use super::errors::{QueryError, QueryResult, StoreError, ValidationError};
use super::paginate::{PageWindow, PagedResult};
use super::request::QueryRequest;
use super::search::SearchFilter;
use super::shape::FieldSelection;
use super::sort::SortClause;
use super::source::{QuerySchema, QuerySource};

/// A validated request resolved against the tables of `T`
#[derive(Debug)]
pub struct QueryPlan<T: 'static> {
    pub search: SearchFilter<T>,
    pub order: Vec<SortClause>,
    pub window: PageWindow,
    pub selection: FieldSelection<T>,
}

impl<T: QuerySchema> QueryPlan<T> {
    /// Resolve sort then field selection; the first failing kind wins
    pub fn new(request: &QueryRequest) -> Result<Self, ValidationError> {
        let order = T::sort_table().resolve(request.sort())?;
        let selection = T::projection().select(request.fields())?;

        Ok(Self {
            search: SearchFilter::new(request.search(), T::search_fields()),
            order,
            window: PageWindow::new(request.page(), request.page_size()),
            selection,
        })
    }
}

/// Runs list queries and records their outcome
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    metrics: Arc<MetricsRegistry>,
}

impl QueryPipeline {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Produce one shaped page from `source`
    pub async fn execute<S: QuerySource>(
        &self,
        source: S,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> QueryResult<PagedResult<Value>> {
        let resource = <S::Item as QuerySchema>::RESOURCE;
        let page = request.page().to_string();
        let page_size = request.page_size().to_string();
        let timer = Timer::new();

        Logger::debug(
            Event::QueryReceived.as_str(),
            &[
                ("resource", resource),
                ("page", &page),
                ("page_size", &page_size),
                ("search", request.search().unwrap_or("")),
                ("sort", request.sort().unwrap_or("")),
                ("fields", request.fields().unwrap_or("")),
            ],
        );

        let result = Self::run(source, request, cancel).await;
        let elapsed = timer.elapsed_ms();

        match &result {
            Ok(paged) => {
                self.metrics.increment_queries_executed();
                let total = paged.total_count.to_string();
                let returned = paged.items.len().to_string();
                Logger::info(
                    Event::QueryExecuted.as_str(),
                    &[
                        ("resource", resource),
                        ("page", &page),
                        ("returned", &returned),
                        ("total", &total),
                        ("duration_ms", &elapsed),
                    ],
                );
            }
            Err(QueryError::Validation(err)) => {
                self.metrics.increment_queries_rejected();
                let message = err.to_string();
                Logger::warn(
                    Event::QueryRejected.as_str(),
                    &[("resource", resource), ("code", err.code()), ("reason", &message)],
                );
            }
            Err(QueryError::Cancelled) => {
                self.metrics.increment_queries_cancelled();
                Logger::info(
                    Event::QueryCancelled.as_str(),
                    &[("resource", resource), ("duration_ms", &elapsed)],
                );
            }
            Err(err @ QueryError::Store(_)) => {
                self.metrics.increment_queries_failed();
                let message = err.to_string();
                Logger::error(
                    Event::QueryFailed.as_str(),
                    &[("resource", resource), ("code", err.code()), ("reason", &message)],
                );
            }
        }

        result
    }

    async fn run<S: QuerySource>(
        source: S,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> QueryResult<PagedResult<Value>> {
        let plan = QueryPlan::<S::Item>::new(request)?;

        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        let query = source.search(plan.search.clone());
        let total = until_cancelled(cancel, query.count()).await?;

        let offset = plan.window.offset();
        if offset >= total {
            return Ok(PagedResult::new(Vec::new(), total, plan.window));
        }

        let records = until_cancelled(
            cancel,
            query
                .order_by(plan.order.clone())
                .skip(offset)
                .take(plan.window.limit())
                .fetch(),
        )
        .await?;

        let projection = <S::Item as QuerySchema>::projection();
        let items = records
            .iter()
            .map(|record| projection.shape(record, &plan.selection))
            .collect();

        Ok(PagedResult::new(items, total, plan.window))
    }
}

/// Await a store call unless the token fires first
async fn until_cancelled<T, F>(cancel: &CancellationToken, call: F) -> QueryResult<T>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(QueryError::Cancelled),
        result = call => result.map_err(QueryError::from),
    }
}
