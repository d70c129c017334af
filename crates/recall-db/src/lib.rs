//! # recall-db
//!
//! PostgreSQL database layer for recall.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for every core entity
//! - The [`Database`] aggregate and its [`Store`] view used by the API
//! - An in-memory store with identical semantics (feature `mock`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use recall_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/recall").await?;
//!     db.migrate().await?;
//!     let store = db.store();
//!     let tags = store.tags.list(user_id).await?;
//!     Ok(())
//! }
//! ```

pub mod bookmarks;
#[cfg(feature = "mock")]
pub mod memory;
pub mod notes;
pub mod pool;
pub mod reminders;
pub mod rooms;
mod rows;
pub mod tags;
pub mod todos;
pub mod users;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use std::sync::Arc;

// Re-export core types
pub use recall_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use bookmarks::PgBookmarkRepository;
#[cfg(feature = "mock")]
pub use memory::InMemoryStore;
pub use notes::PgNoteRepository;
pub use pool::PoolConfig;
pub use reminders::PgReminderRepository;
pub use rooms::{PgRoomBookmarkRepository, PgRoomMemberRepository, PgRoomRepository};
pub use tags::PgTagRepository;
pub use todos::PgTodoRepository;
pub use users::{PgSessionRepository, PgUserRepository};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    store: Store,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        let store = Store {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            bookmarks: Arc::new(PgBookmarkRepository::new(pool.clone())),
            tags: Arc::new(PgTagRepository::new(pool.clone())),
            reminders: Arc::new(PgReminderRepository::new(pool.clone())),
            notes: Arc::new(PgNoteRepository::new(pool.clone())),
            todos: Arc::new(PgTodoRepository::new(pool.clone())),
            rooms: Arc::new(PgRoomRepository::new(pool.clone())),
            members: Arc::new(PgRoomMemberRepository::new(pool.clone())),
            room_bookmarks: Arc::new(PgRoomBookmarkRepository::new(pool.clone())),
        };
        Self { pool, store }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PoolConfig::default().connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = config.connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Repositories as trait objects, for handlers and jobs.
    pub fn store(&self) -> Store {
        self.store.clone()
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Close every pooled connection; used on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
