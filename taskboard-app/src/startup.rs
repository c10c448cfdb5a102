//! Board selection at startup
//!
//! The client opens the user's first board. A default board is created only
//! when the board list loaded and came back empty; a failed list is an error,
//! so a flaky store never produces duplicate default boards.

use taskboard_shared::session::User;
use taskboard_sync::aggregate::{BoardAggregate, DEFAULT_BOARD_NAME};
use taskboard_sync::cache::BoardCache;
use taskboard_sync::{SyncError, SyncResult};
use uuid::Uuid;

/// Loads the user's boards and scopes the aggregate to the first one
///
/// The aggregate must already carry `user`.
///
/// # Errors
///
/// - the board list error if the boards could not be fetched
/// - the `create_default_board` error if the user has no boards and the
///   default board could not be created
pub async fn open_first_board(
    boards: &mut BoardCache,
    aggregate: &BoardAggregate,
    user: Option<User>,
) -> SyncResult<Uuid> {
    if !boards.set_user(user).await {
        let err = boards
            .error()
            .cloned()
            .unwrap_or_else(|| SyncError::Invalid("board list unavailable".to_string()));
        tracing::error!(error = %err, "Could not list boards");
        return Err(err);
    }

    let board_id = match boards.boards().first() {
        Some(board) => board.id,
        None => {
            tracing::info!("No boards yet, creating the default board");
            let (board, _) = aggregate.create_default_board(DEFAULT_BOARD_NAME).await?;
            board.id
        }
    };

    aggregate.set_board(Some(board_id)).await?;
    Ok(board_id)
}
