//! Favorite reads and the toggle write path.

use podshop_core::{Favorite, FavoriteIntent, FavoriteState};
use uuid::Uuid;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::query::Query;

/// Reads whether `product_id` is in the user's favorites.
///
/// # Errors
///
/// Returns [`BackendError`] if the backend request fails.
pub async fn is_favorited(
    client: &BackendClient,
    user_id: Uuid,
    product_id: i64,
) -> Result<bool, BackendError> {
    let rows: Vec<Favorite> = client
        .select(
            "favorites",
            &Query::new()
                .select("user_id,product_id")
                .eq("user_id", user_id)
                .eq("product_id", product_id)
                .limit(1),
        )
        .await?;
    Ok(!rows.is_empty())
}

/// Toggles a favorite and reconciles `state` with the backend.
///
/// A toggle issued while another is pending is ignored and returns the
/// current optimistic value. An insert that hits the unique constraint means
/// the row already exists and counts as success. Any other write failure is
/// reconciled by reading the actual state; if that read fails too, `state`
/// reverts to its pre-toggle value and the write error is returned.
///
/// # Errors
///
/// Returns the write's [`BackendError`] when neither the write nor the
/// reconciling read succeeded.
pub async fn toggle_favorite(
    client: &BackendClient,
    user_id: Uuid,
    product_id: i64,
    state: &mut FavoriteState,
) -> Result<bool, BackendError> {
    let Some(intent) = state.begin_toggle() else {
        return Ok(state.is_favorited());
    };

    let write = match intent {
        FavoriteIntent::Add => client
            .insert_minimal("favorites", &Favorite { user_id, product_id })
            .await
            .or_else(|e| if e.is_unique_violation() { Ok(()) } else { Err(e) }),
        FavoriteIntent::Remove => {
            client
                .delete(
                    "favorites",
                    &Query::new()
                        .eq("user_id", user_id)
                        .eq("product_id", product_id),
                )
                .await
        }
    };

    match write {
        Ok(()) => {
            let value = intent == FavoriteIntent::Add;
            state.settle(value);
            Ok(value)
        }
        Err(write_err) => {
            tracing::warn!(
                %user_id,
                product_id,
                ?intent,
                error = %write_err,
                "favorite write failed; re-reading"
            );
            match is_favorited(client, user_id, product_id).await {
                Ok(actual) => {
                    state.settle(actual);
                    Ok(actual)
                }
                Err(read_err) => {
                    tracing::error!(
                        %user_id,
                        product_id,
                        error = %read_err,
                        "favorite reconcile failed; reverting"
                    );
                    state.revert();
                    Err(write_err)
                }
            }
        }
    }
}
