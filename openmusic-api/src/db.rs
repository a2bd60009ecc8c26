//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the Postgres
//! implementation of [`CatalogStore`].
//!
//! Unique index violations (SQLSTATE 23505) surface as
//! `StorageError::UniqueViolation`; every other driver error becomes
//! `StorageError::Backend`. Playlist membership changes and their ledger
//! records share one transaction.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool_postgres::{
    Config, GenericClient, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime,
};
use openmusic_core::{
    Activity, ActivityAction, ActivityEntry, Album, AlbumId, AlbumUpdate, CollaborationId,
    EntityType, Like, NewAlbum, NewPlaylist, NewSong, NewUser, OpenMusicError, OpenMusicResult,
    Playlist, PlaylistId, PlaylistSummary, Song, SongFilter, SongId, SongSummary, SongUpdate,
    StorageError, Timestamp, User, UserId,
};
use openmusic_storage::CatalogStore;
use tokio_postgres::{error::SqlState, types::FromSql, NoTls, Row};

use crate::config::{env_parse, env_var};
use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;

/// Schema applied at startup.
const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection wait timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "openmusic".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// `OPENMUSIC_DB_*` variables win; the libpq names (`PGHOST`, `PGPORT`,
    /// `PGUSER`, `PGPASSWORD`, `PGDATABASE`) are honoured as fallbacks.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_var("OPENMUSIC_DB_HOST", "PGHOST").unwrap_or(defaults.host),
            port: env_parse("OPENMUSIC_DB_PORT", "PGPORT").unwrap_or(defaults.port),
            dbname: env_var("OPENMUSIC_DB_NAME", "PGDATABASE").unwrap_or(defaults.dbname),
            user: env_var("OPENMUSIC_DB_USER", "PGUSER").unwrap_or(defaults.user),
            password: env_var("OPENMUSIC_DB_PASSWORD", "PGPASSWORD").unwrap_or_default(),
            max_size: env_parse("OPENMUSIC_DB_POOL_SIZE", "PGPOOLSIZE")
                .unwrap_or(defaults.max_size),
            timeout: Duration::from_secs(
                env_parse("OPENMUSIC_DB_TIMEOUT", "PGCONNECT_TIMEOUT").unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(self.max_size);
        pool_config.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

/// Create the catalog tables if they do not exist.
pub async fn apply_schema(pool: &Pool) -> ApiResult<()> {
    let conn = pool.get().await?;
    conn.batch_execute(SCHEMA).await?;
    tracing::info!("Database schema applied");
    Ok(())
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn map_pg(err: tokio_postgres::Error, entity_type: EntityType) -> OpenMusicError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let constraint = err
            .as_db_error()
            .and_then(|db| db.constraint())
            .unwrap_or("unknown")
            .to_string();
        return StorageError::UniqueViolation {
            entity_type,
            constraint,
        }
        .into();
    }
    StorageError::Backend {
        reason: err.to_string(),
    }
    .into()
}

fn map_pool(err: deadpool_postgres::PoolError) -> OpenMusicError {
    StorageError::Backend {
        reason: format!("connection pool: {}", err),
    }
    .into()
}

fn map_tx(err: tokio_postgres::Error) -> OpenMusicError {
    StorageError::TransactionFailed {
        reason: err.to_string(),
    }
    .into()
}

/// Typed column read. A type mismatch is a corrupt row, not a panic.
fn col<'a, T: FromSql<'a>>(row: &'a Row, table: &str, name: &str) -> OpenMusicResult<T> {
    row.try_get(name).map_err(|e| {
        StorageError::CorruptRow {
            table: table.to_string(),
            reason: format!("column {}: {}", name, e),
        }
        .into()
    })
}

fn album_from_row(row: &Row) -> OpenMusicResult<Album> {
    Ok(Album {
        id: AlbumId::new(col::<String>(row, "albums", "id")?),
        name: col(row, "albums", "name")?,
        year: col(row, "albums", "year")?,
        cover_url: col(row, "albums", "cover_url")?,
        created_at: col::<Timestamp>(row, "albums", "created_at")?,
        updated_at: col::<Timestamp>(row, "albums", "updated_at")?,
    })
}

fn song_from_row(row: &Row) -> OpenMusicResult<Song> {
    Ok(Song {
        id: SongId::new(col::<String>(row, "songs", "id")?),
        title: col(row, "songs", "title")?,
        year: col(row, "songs", "year")?,
        genre: col(row, "songs", "genre")?,
        performer: col(row, "songs", "performer")?,
        duration: col(row, "songs", "duration")?,
        album_id: col::<Option<String>>(row, "songs", "album_id")?.map(AlbumId::new),
    })
}

fn song_summary_from_row(row: &Row) -> OpenMusicResult<SongSummary> {
    Ok(SongSummary {
        id: SongId::new(col::<String>(row, "songs", "id")?),
        title: col(row, "songs", "title")?,
        performer: col(row, "songs", "performer")?,
    })
}

fn user_from_row(row: &Row) -> OpenMusicResult<User> {
    Ok(User {
        id: UserId::new(col::<String>(row, "users", "id")?),
        username: col(row, "users", "username")?,
        password_hash: col(row, "users", "password")?,
        fullname: col(row, "users", "fullname")?,
    })
}

fn playlist_summary_from_row(row: &Row) -> OpenMusicResult<PlaylistSummary> {
    Ok(PlaylistSummary {
        id: PlaylistId::new(col::<String>(row, "playlists", "id")?),
        name: col(row, "playlists", "name")?,
        username: col(row, "users", "username")?,
    })
}

// ============================================================================
// POSTGRES CATALOG STORE
// ============================================================================

/// [`CatalogStore`] over a deadpool-postgres pool.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: Pool,
}

impl PgCatalogStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn conn(&self) -> OpenMusicResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(map_pool)
    }

    /// Run one store operation and record its latency and outcome.
    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> OpenMusicResult<T>
    where
        F: Future<Output = OpenMusicResult<T>> + Send,
    {
        let start = Instant::now();
        let result = fut.await;
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_db_operation(operation, result.is_ok(), start.elapsed().as_secs_f64());
        }
        result
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    // ========================================================================
    // ALBUM OPERATIONS
    // ========================================================================

    async fn album_insert(&self, album: &NewAlbum) -> OpenMusicResult<AlbumId> {
        self.timed("album_insert", async {
            let id = AlbumId::generate();
            let conn = self.conn().await?;
            conn.execute(
                "INSERT INTO albums (id, name, year) VALUES ($1, $2, $3)",
                &[&id.as_str(), &album.name, &album.year],
            )
            .await
            .map_err(|e| map_pg(e, EntityType::Album))?;
            Ok(id)
        })
        .await
    }

    async fn album_get(&self, id: &AlbumId) -> OpenMusicResult<Option<Album>> {
        self.timed("album_get", async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    "SELECT id, name, year, cover_url, created_at, updated_at \
                     FROM albums WHERE id = $1",
                    &[&id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Album))?;
            row.as_ref().map(album_from_row).transpose()
        })
        .await
    }

    async fn album_update(&self, id: &AlbumId, update: &AlbumUpdate) -> OpenMusicResult<bool> {
        self.timed("album_update", async {
            let conn = self.conn().await?;
            let affected = conn
                .execute(
                    "UPDATE albums SET name = $1, year = $2, updated_at = now() WHERE id = $3",
                    &[&update.name, &update.year, &id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Album))?;
            Ok(affected == 1)
        })
        .await
    }

    async fn album_set_cover(&self, id: &AlbumId, cover_url: &str) -> OpenMusicResult<bool> {
        self.timed("album_set_cover", async {
            let conn = self.conn().await?;
            let affected = conn
                .execute(
                    "UPDATE albums SET cover_url = $1, updated_at = now() WHERE id = $2",
                    &[&cover_url, &id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Album))?;
            Ok(affected == 1)
        })
        .await
    }

    async fn album_delete(&self, id: &AlbumId) -> OpenMusicResult<bool> {
        self.timed("album_delete", async {
            let conn = self.conn().await?;
            // songs.album_id is ON DELETE SET NULL, likes cascade.
            let affected = conn
                .execute("DELETE FROM albums WHERE id = $1", &[&id.as_str()])
                .await
                .map_err(|e| map_pg(e, EntityType::Album))?;
            Ok(affected == 1)
        })
        .await
    }

    // ========================================================================
    // SONG OPERATIONS
    // ========================================================================

    async fn song_insert(&self, song: &NewSong) -> OpenMusicResult<SongId> {
        self.timed("song_insert", async {
            let id = SongId::generate();
            let album_id = song.album_id.as_ref().map(|a| a.as_str());
            let conn = self.conn().await?;
            conn.execute(
                "INSERT INTO songs (id, title, year, genre, performer, duration, album_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &id.as_str(),
                    &song.title,
                    &song.year,
                    &song.genre,
                    &song.performer,
                    &song.duration,
                    &album_id,
                ],
            )
            .await
            .map_err(|e| map_pg(e, EntityType::Song))?;
            Ok(id)
        })
        .await
    }

    async fn song_get(&self, id: &SongId) -> OpenMusicResult<Option<Song>> {
        self.timed("song_get", async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    "SELECT id, title, year, genre, performer, duration, album_id \
                     FROM songs WHERE id = $1",
                    &[&id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Song))?;
            row.as_ref().map(song_from_row).transpose()
        })
        .await
    }

    async fn song_list(&self, filter: &SongFilter) -> OpenMusicResult<Vec<SongSummary>> {
        self.timed("song_list", async {
            let conn = self.conn().await?;
            // strpos keeps the match literal; ILIKE would treat % and _ as wildcards.
            let rows = conn
                .query(
                    "SELECT id, title, performer FROM songs \
                     WHERE ($1::text IS NULL OR strpos(lower(title), lower($1)) > 0) \
                       AND ($2::text IS NULL OR strpos(lower(performer), lower($2)) > 0) \
                     ORDER BY id",
                    &[&filter.title.as_deref(), &filter.performer.as_deref()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Song))?;
            rows.iter().map(song_summary_from_row).collect()
        })
        .await
    }

    async fn song_list_by_album(&self, album_id: &AlbumId) -> OpenMusicResult<Vec<SongSummary>> {
        self.timed("song_list_by_album", async {
            let conn = self.conn().await?;
            let rows = conn
                .query(
                    "SELECT id, title, performer FROM songs WHERE album_id = $1 ORDER BY id",
                    &[&album_id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Song))?;
            rows.iter().map(song_summary_from_row).collect()
        })
        .await
    }

    async fn song_update(&self, id: &SongId, update: &SongUpdate) -> OpenMusicResult<bool> {
        self.timed("song_update", async {
            let album_id = update.album_id.as_ref().map(|a| a.as_str());
            let conn = self.conn().await?;
            let affected = conn
                .execute(
                    "UPDATE songs SET title = $1, year = $2, genre = $3, performer = $4, \
                     duration = $5, album_id = $6 WHERE id = $7",
                    &[
                        &update.title,
                        &update.year,
                        &update.genre,
                        &update.performer,
                        &update.duration,
                        &album_id,
                        &id.as_str(),
                    ],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Song))?;
            Ok(affected == 1)
        })
        .await
    }

    async fn song_delete(&self, id: &SongId) -> OpenMusicResult<bool> {
        self.timed("song_delete", async {
            let conn = self.conn().await?;
            let affected = conn
                .execute("DELETE FROM songs WHERE id = $1", &[&id.as_str()])
                .await
                .map_err(|e| map_pg(e, EntityType::Song))?;
            Ok(affected == 1)
        })
        .await
    }

    // ========================================================================
    // USER & SESSION OPERATIONS
    // ========================================================================

    async fn user_insert(&self, user: &NewUser) -> OpenMusicResult<UserId> {
        self.timed("user_insert", async {
            let id = UserId::generate();
            let conn = self.conn().await?;
            conn.execute(
                "INSERT INTO users (id, username, password, fullname) VALUES ($1, $2, $3, $4)",
                &[&id.as_str(), &user.username, &user.password_hash, &user.fullname],
            )
            .await
            .map_err(|e| map_pg(e, EntityType::User))?;
            Ok(id)
        })
        .await
    }

    async fn user_get(&self, id: &UserId) -> OpenMusicResult<Option<User>> {
        self.timed("user_get", async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    "SELECT id, username, password, fullname FROM users WHERE id = $1",
                    &[&id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::User))?;
            row.as_ref().map(user_from_row).transpose()
        })
        .await
    }

    async fn user_get_by_username(&self, username: &str) -> OpenMusicResult<Option<User>> {
        self.timed("user_get_by_username", async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    "SELECT id, username, password, fullname FROM users WHERE username = $1",
                    &[&username],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::User))?;
            row.as_ref().map(user_from_row).transpose()
        })
        .await
    }

    async fn refresh_token_insert(&self, token_digest: &str) -> OpenMusicResult<()> {
        self.timed("refresh_token_insert", async {
            let conn = self.conn().await?;
            conn.execute(
                "INSERT INTO authentications (token) VALUES ($1) ON CONFLICT DO NOTHING",
                &[&token_digest],
            )
            .await
            .map_err(|e| map_pg(e, EntityType::User))?;
            Ok(())
        })
        .await
    }

    async fn refresh_token_exists(&self, token_digest: &str) -> OpenMusicResult<bool> {
        self.timed("refresh_token_exists", async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    "SELECT 1 FROM authentications WHERE token = $1",
                    &[&token_digest],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::User))?;
            Ok(row.is_some())
        })
        .await
    }

    async fn refresh_token_delete(&self, token_digest: &str) -> OpenMusicResult<bool> {
        self.timed("refresh_token_delete", async {
            let conn = self.conn().await?;
            let affected = conn
                .execute("DELETE FROM authentications WHERE token = $1", &[&token_digest])
                .await
                .map_err(|e| map_pg(e, EntityType::User))?;
            Ok(affected > 0)
        })
        .await
    }

    // ========================================================================
    // PLAYLIST OPERATIONS
    // ========================================================================

    async fn playlist_insert(&self, playlist: &NewPlaylist) -> OpenMusicResult<PlaylistId> {
        self.timed("playlist_insert", async {
            let id = PlaylistId::generate();
            let conn = self.conn().await?;
            conn.execute(
                "INSERT INTO playlists (id, name, owner) VALUES ($1, $2, $3)",
                &[&id.as_str(), &playlist.name, &playlist.owner.as_str()],
            )
            .await
            .map_err(|e| map_pg(e, EntityType::Playlist))?;
            Ok(id)
        })
        .await
    }

    async fn playlist_get(&self, id: &PlaylistId) -> OpenMusicResult<Option<Playlist>> {
        self.timed("playlist_get", async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    "SELECT id, name, owner FROM playlists WHERE id = $1",
                    &[&id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Playlist))?;
            row.map(|row| -> OpenMusicResult<Playlist> {
                Ok(Playlist {
                    id: PlaylistId::new(col::<String>(&row, "playlists", "id")?),
                    name: col(&row, "playlists", "name")?,
                    owner: UserId::new(col::<String>(&row, "playlists", "owner")?),
                })
            })
            .transpose()
        })
        .await
    }

    async fn playlist_summary(&self, id: &PlaylistId) -> OpenMusicResult<Option<PlaylistSummary>> {
        self.timed("playlist_summary", async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    "SELECT p.id, p.name, u.username FROM playlists p \
                     JOIN users u ON u.id = p.owner WHERE p.id = $1",
                    &[&id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Playlist))?;
            row.as_ref().map(playlist_summary_from_row).transpose()
        })
        .await
    }

    async fn playlist_list_for_user(
        &self,
        user_id: &UserId,
    ) -> OpenMusicResult<Vec<PlaylistSummary>> {
        self.timed("playlist_list_for_user", async {
            let conn = self.conn().await?;
            // At most one collaboration per (playlist, user), so no duplicates.
            let rows = conn
                .query(
                    "SELECT p.id, p.name, u.username FROM playlists p \
                     JOIN users u ON u.id = p.owner \
                     LEFT JOIN collaborations c ON c.playlist_id = p.id AND c.user_id = $1 \
                     WHERE p.owner = $1 OR c.user_id = $1 \
                     ORDER BY p.id",
                    &[&user_id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Playlist))?;
            rows.iter().map(playlist_summary_from_row).collect()
        })
        .await
    }

    async fn playlist_delete(&self, id: &PlaylistId) -> OpenMusicResult<bool> {
        self.timed("playlist_delete", async {
            let conn = self.conn().await?;
            let affected = conn
                .execute("DELETE FROM playlists WHERE id = $1", &[&id.as_str()])
                .await
                .map_err(|e| map_pg(e, EntityType::Playlist))?;
            Ok(affected == 1)
        })
        .await
    }

    async fn playlist_songs(&self, id: &PlaylistId) -> OpenMusicResult<Vec<SongSummary>> {
        self.timed("playlist_songs", async {
            let conn = self.conn().await?;
            let rows = conn
                .query(
                    "SELECT s.id, s.title, s.performer FROM playlist_songs ps \
                     JOIN songs s ON s.id = ps.song_id \
                     WHERE ps.playlist_id = $1 ORDER BY ps.id",
                    &[&id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Playlist))?;
            rows.iter().map(song_summary_from_row).collect()
        })
        .await
    }

    async fn playlist_song_add_with_activity(&self, activity: &Activity) -> OpenMusicResult<()> {
        self.timed("playlist_song_add", async {
            let mut conn = self.conn().await?;
            let tx = conn.transaction().await.map_err(map_tx)?;
            tx.execute(
                "INSERT INTO playlist_songs (playlist_id, song_id) VALUES ($1, $2)",
                &[&activity.playlist_id.as_str(), &activity.song_id.as_str()],
            )
            .await
            .map_err(|e| map_pg(e, EntityType::Playlist))?;
            insert_activity(&tx, activity, ActivityAction::Add).await?;
            tx.commit().await.map_err(map_tx)?;
            Ok(())
        })
        .await
    }

    async fn playlist_song_remove_with_activity(
        &self,
        activity: &Activity,
    ) -> OpenMusicResult<bool> {
        self.timed("playlist_song_remove", async {
            let mut conn = self.conn().await?;
            let tx = conn.transaction().await.map_err(map_tx)?;
            let removed = tx
                .execute(
                    "DELETE FROM playlist_songs WHERE playlist_id = $1 AND song_id = $2",
                    &[&activity.playlist_id.as_str(), &activity.song_id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Playlist))?;
            if removed == 0 {
                // Dropping the transaction rolls it back.
                return Ok(false);
            }
            insert_activity(&tx, activity, ActivityAction::Delete).await?;
            tx.commit().await.map_err(map_tx)?;
            Ok(true)
        })
        .await
    }

    // ========================================================================
    // COLLABORATION OPERATIONS
    // ========================================================================

    async fn collaboration_insert(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<CollaborationId> {
        self.timed("collaboration_insert", async {
            let id = CollaborationId::generate();
            let conn = self.conn().await?;
            conn.execute(
                "INSERT INTO collaborations (id, playlist_id, user_id) VALUES ($1, $2, $3)",
                &[&id.as_str(), &playlist_id.as_str(), &user_id.as_str()],
            )
            .await
            .map_err(|e| map_pg(e, EntityType::Collaboration))?;
            Ok(id)
        })
        .await
    }

    async fn collaboration_exists(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<bool> {
        self.timed("collaboration_exists", async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    "SELECT 1 FROM collaborations WHERE playlist_id = $1 AND user_id = $2",
                    &[&playlist_id.as_str(), &user_id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Collaboration))?;
            Ok(row.is_some())
        })
        .await
    }

    async fn collaboration_delete(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<bool> {
        self.timed("collaboration_delete", async {
            let conn = self.conn().await?;
            let affected = conn
                .execute(
                    "DELETE FROM collaborations WHERE playlist_id = $1 AND user_id = $2",
                    &[&playlist_id.as_str(), &user_id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Collaboration))?;
            Ok(affected == 1)
        })
        .await
    }

    // ========================================================================
    // ACTIVITY LEDGER
    // ========================================================================

    async fn activity_insert(&self, activity: &Activity) -> OpenMusicResult<()> {
        self.timed("activity_insert", async {
            let conn = self.conn().await?;
            insert_activity(&conn, activity, activity.action).await
        })
        .await
    }

    async fn activity_list(&self, playlist_id: &PlaylistId) -> OpenMusicResult<Vec<ActivityEntry>> {
        self.timed("activity_list", async {
            let conn = self.conn().await?;
            let rows = conn
                .query(
                    "SELECT u.username, s.title, a.action, a.time \
                     FROM playlist_song_activities a \
                     LEFT JOIN users u ON u.id = a.user_id \
                     LEFT JOIN songs s ON s.id = a.song_id \
                     WHERE a.playlist_id = $1 \
                     ORDER BY a.time ASC, a.seq ASC",
                    &[&playlist_id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Activity))?;
            rows.iter()
                .map(|row| {
                    let action: String = col(row, "playlist_song_activities", "action")?;
                    let action = action.parse::<ActivityAction>().map_err(|reason| {
                        OpenMusicError::from(StorageError::CorruptRow {
                            table: "playlist_song_activities".to_string(),
                            reason,
                        })
                    })?;
                    Ok(ActivityEntry {
                        username: col(row, "users", "username")?,
                        title: col(row, "songs", "title")?,
                        action,
                        time: col(row, "playlist_song_activities", "time")?,
                    })
                })
                .collect()
        })
        .await
    }

    // ========================================================================
    // LIKE OPERATIONS
    // ========================================================================

    async fn like_insert(&self, like: &Like) -> OpenMusicResult<()> {
        self.timed("like_insert", async {
            let conn = self.conn().await?;
            conn.execute(
                "INSERT INTO user_album_likes (id, user_id, album_id, created_at) \
                 VALUES ($1, $2, $3, $4)",
                &[
                    &like.id.as_str(),
                    &like.user_id.as_str(),
                    &like.album_id.as_str(),
                    &like.created_at,
                ],
            )
            .await
            .map_err(|e| map_pg(e, EntityType::Like))?;
            Ok(())
        })
        .await
    }

    async fn like_delete(&self, user_id: &UserId, album_id: &AlbumId) -> OpenMusicResult<bool> {
        self.timed("like_delete", async {
            let conn = self.conn().await?;
            let affected = conn
                .execute(
                    "DELETE FROM user_album_likes WHERE user_id = $1 AND album_id = $2",
                    &[&user_id.as_str(), &album_id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Like))?;
            Ok(affected == 1)
        })
        .await
    }

    async fn like_count(&self, album_id: &AlbumId) -> OpenMusicResult<u64> {
        self.timed("like_count", async {
            let conn = self.conn().await?;
            let row = conn
                .query_one(
                    "SELECT COUNT(*) AS likes FROM user_album_likes WHERE album_id = $1",
                    &[&album_id.as_str()],
                )
                .await
                .map_err(|e| map_pg(e, EntityType::Like))?;
            let count: i64 = col(&row, "user_album_likes", "likes")?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    // ========================================================================
    // HEALTH
    // ========================================================================

    async fn ping(&self) -> OpenMusicResult<()> {
        let conn = self.conn().await?;
        conn.simple_query("SELECT 1")
            .await
            .map_err(|e| map_pg(e, EntityType::Album))?;
        Ok(())
    }
}

/// Append a ledger record through any client or transaction.
async fn insert_activity<C>(
    client: &C,
    activity: &Activity,
    action: ActivityAction,
) -> OpenMusicResult<()>
where
    C: GenericClient,
{
    client
        .execute(
            "INSERT INTO playlist_song_activities \
             (id, playlist_id, song_id, user_id, action, time) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &activity.id.as_str(),
                &activity.playlist_id.as_str(),
                &activity.song_id.as_str(),
                &activity.user_id.as_str(),
                &action.as_str(),
                &activity.time,
            ],
        )
        .await
        .map_err(|e| map_pg(e, EntityType::Activity))?;
    Ok(())
}
