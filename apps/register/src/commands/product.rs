//! # Product Commands
//!
//! Product lookup. Search results become the session's catalog cache, which
//! is where `add_item` finds products by id.

use tracing::debug;

use till_client::PosApi;
use till_core::validation::validate_search_query;
use till_core::Product;

use crate::error::ApiError;
use crate::state::SessionState;

/// Searches products by name, SKU or barcode.
///
/// ## Behavior
/// - Queries shorter than 2 characters (after trimming) return nothing and
///   make no request; the catalog cache is left as it was
/// - Queries longer than 100 characters are rejected
/// - Otherwise the results replace the catalog cache
pub async fn search(
    api: &dyn PosApi,
    session: &SessionState,
    query: &str,
) -> Result<Vec<Product>, ApiError> {
    debug!(query = %query, "search command");

    let Some(query) = validate_search_query(query)? else {
        return Ok(Vec::new());
    };

    let products = api.search_products(&query).await?;
    session.with_session_mut(|s| s.catalog = products.clone());
    Ok(products)
}

/// Loads the default product list into the catalog cache.
pub async fn load_catalog(
    api: &dyn PosApi,
    session: &SessionState,
) -> Result<Vec<Product>, ApiError> {
    debug!("load_catalog command");

    let products = api.list_products().await?;
    session.with_session_mut(|s| s.catalog = products.clone());
    Ok(products)
}
