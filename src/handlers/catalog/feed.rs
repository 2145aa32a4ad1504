use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::services::catalog::FeedTierLimits;
use crate::AppState;

pub fn feed_routes() -> Router<AppState> {
    Router::new().route("/", get(home_feed))
}

/// Query parameters for the home feed. Tier limits default from config and
/// may only be tuned downwards.
#[derive(Debug, Deserialize, IntoParams)]
pub struct FeedQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub boost_limit: Option<u64>,
    pub most_viewed_limit: Option<u64>,
    pub other_limit: Option<u64>,
}

/// Composed storefront feed: boosted, then most-viewed, then newest
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    params(FeedQuery),
    responses(
        (status = 200, description = "Merged, deduplicated, paginated feed", body = crate::services::catalog::FeedPage)
    ),
    tag = "Feed"
)]
pub async fn home_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let limits = FeedTierLimits {
        boost: query
            .boost_limit
            .unwrap_or(state.config.feed_boost_limit)
            .min(state.config.feed_boost_limit),
        most_viewed: query
            .most_viewed_limit
            .unwrap_or(state.config.feed_most_viewed_limit)
            .min(state.config.feed_most_viewed_limit),
        other: query
            .other_limit
            .unwrap_or(state.config.feed_other_limit)
            .min(state.config.feed_other_limit),
    };

    let feed = state
        .services
        .feed
        .compose_feed(page, per_page, limits)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(feed))
}
