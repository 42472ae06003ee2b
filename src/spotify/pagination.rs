//! Cursor-following collector for Spotify's paginated listings.
//!
//! Spotify pages look like `{"items": [...], "next": "https://...", ...}`.
//! The collector walks `next` until it runs out, or until a page comes back
//! without items, projecting every raw item on the way.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Something that can GET a JSON document on behalf of a bearer token.
///
/// Implementations must map non-success statuses to [`AppError::Upstream`].
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get_json(&self, url: &str, bearer: &str) -> AppResult<Value>;
}

/// Follow `next` cursors from `seed_url` and return every projected item.
///
/// Items for which `project` returns `None` are dropped. A page without an
/// `items` array, or with an empty one, ends the walk normally. A cursor that
/// was already requested in this walk is treated as a protocol violation.
pub async fn collect<S, T, F>(
    source: &S,
    seed_url: &str,
    bearer: &str,
    mut project: F,
) -> AppResult<Vec<T>>
where
    S: PageSource + ?Sized,
    F: FnMut(Value) -> Option<T>,
{
    let mut collected = Vec::new();
    let mut requested = HashSet::new();
    let mut next = Some(seed_url.to_string());

    while let Some(url) = next.take() {
        if !requested.insert(url.clone()) {
            tracing::warn!(url = %url, "Spotify returned a cursor that was already followed");
            return Err(AppError::CursorLoop(url));
        }

        let mut body = source.get_json(&url, bearer).await?;

        let items = match body.get_mut("items").map(Value::take) {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => {
                tracing::debug!(url = %url, "Page has no items, stopping");
                break;
            }
        };

        let page_len = items.len();
        let before = collected.len();
        collected.extend(items.into_iter().filter_map(&mut project));

        tracing::debug!(
            url = %url,
            page_items = page_len,
            kept = collected.len() - before,
            "Fetched page"
        );

        next = body
            .get("next")
            .and_then(Value::as_str)
            .map(str::to_owned);
    }

    tracing::info!(
        seed = %seed_url,
        pages = requested.len(),
        items = collected.len(),
        "Pagination complete"
    );

    Ok(collected)
}

/// Lift a projection over a typed item into one over raw JSON.
///
/// Items that fail to deserialize as `I` are dropped, the same as items the
/// projection itself rejects.
pub fn typed<I, T, F>(project: F) -> impl Fn(Value) -> Option<T> + Copy
where
    I: DeserializeOwned,
    F: Fn(I) -> Option<T> + Copy,
{
    move |value| serde_json::from_value(value).ok().and_then(project)
}
