//! # Taskboard
//!
//! Terminal client for the task board. Connects to the configured store (or
//! an in-memory store seeded with the demo board), opens the user's first
//! board and prints it in the saved view mode. Realtime refreshes are
//! adopted and reprinted until ctrl-c.
//!
//! ## Usage
//!
//! ```bash
//! TASKBOARD_STORE__BACKEND=memory cargo run -p taskboard-app
//! ```

use std::sync::Arc;
use taskboard_app::demo;
use taskboard_app::preferences::PreferenceStore;
use taskboard_app::startup;
use taskboard_app::views;
use taskboard_shared::config::{ClientConfig, StoreBackend};
use taskboard_shared::schema::SchemaCapabilities;
use taskboard_shared::session::{LocalSession, SessionProvider, User};
use taskboard_shared::store::{MemoryStore, RemoteStore, RestStore};
use taskboard_sync::aggregate::BoardAggregate;
use taskboard_sync::cache::BoardCache;
use taskboard_sync::controller::BoardController;
use taskboard_sync::notify::LogNotifier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=info,taskboard_app=info,taskboard_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Taskboard v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::load()?;

    let mut user = User::new(config.session.user_id.unwrap_or_else(Uuid::new_v4));
    if let Some(email) = &config.session.email {
        user = user.with_email(email);
    }
    let session = LocalSession::signed_in(user.clone());

    let store: Arc<dyn RemoteStore> = match config.store.backend {
        StoreBackend::Memory => {
            let memory = Arc::new(MemoryStore::new());
            demo::seed(&memory, user.id).await?;
            memory
        }
        StoreBackend::Rest => Arc::new(RestStore::new(config.store.rest()?)?),
    };
    tracing::info!(store = store.name(), user_id = %user.id, "Store connected");

    let aggregate = BoardAggregate::new(Arc::clone(&store), config.sync.debounce());
    aggregate.set_user(session.current_user().await).await?;

    let mut boards = BoardCache::new(Arc::clone(&store), Arc::new(SchemaCapabilities::new()));
    startup::open_first_board(&mut boards, &aggregate, session.current_user().await).await?;

    let mut controller = BoardController::from_aggregate(&aggregate, Arc::new(LogNotifier));
    controller.sync_from_snapshot(&aggregate.snapshot());

    let preferences = PreferenceStore::new(&config.preferences.path);
    let mode = preferences.load().await.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Could not read view mode");
        Default::default()
    });
    preferences.save(mode).await?;

    if let Some(board) = &aggregate.snapshot().board {
        println!("== {} [{}] ==", board.name, mode);
    }
    println!("{}", views::render(mode, controller.columns(), controller.working()));

    let mut snapshots = aggregate.subscribe();
    let mut session_changes = session.watch();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.loading {
                    continue;
                }
                if controller.sync_from_snapshot(&snapshot) {
                    tracing::info!(
                        revision = snapshot.revision,
                        tasks = snapshot.task_count(),
                        "Board refreshed"
                    );
                    println!("{}", views::render(mode, controller.columns(), controller.working()));
                }
            }

            changed = session_changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let user = session_changes.borrow_and_update().clone();
                if let Err(err) = aggregate.set_user(user).await {
                    tracing::warn!(error = %err, "Reload after session change failed");
                }
            }
        }
    }

    tracing::info!("Shutdown signal received, exiting...");
    aggregate.shutdown().await;

    Ok(())
}
