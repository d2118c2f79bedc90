use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::curator::ListEntry;
use crate::models::{Camera, Photo, PhotoId, RoverRef};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Mirrors the curated list on disk so a story survives restarts.
pub struct ListDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl ListDatabase {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened list database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS list_entries (
                id INTEGER PRIMARY KEY,
                rover_name TEXT NOT NULL,
                camera_name TEXT NOT NULL,
                camera_full_name TEXT NOT NULL,
                earth_date TEXT NOT NULL,
                sol INTEGER,
                img_src TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                position INTEGER NOT NULL,
                added_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Failed to lock database connection"))
    }

    /// Appends an entry after the current last position. An id that is
    /// already stored is left untouched.
    pub fn add_entry(&self, entry: &ListEntry) -> Result<()> {
        let photo = &entry.photo;
        let conn = self.lock()?;
        let next_position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM list_entries",
            [],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO list_entries
                (id, rover_name, camera_name, camera_full_name, earth_date, sol, img_src, description, position, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                to_sql_id(photo.id)?,
                photo.rover.name,
                photo.camera.name,
                photo.camera.full_name,
                photo.earth_date.format(DATE_FORMAT).to_string(),
                photo.sol,
                photo.img_src,
                entry.description,
                next_position,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn remove_entry(&self, id: PhotoId) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM list_entries WHERE id = ?1", params![to_sql_id(id)?])?;
        Ok(())
    }

    pub fn update_description(&self, id: PhotoId, description: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE list_entries SET description = ?1 WHERE id = ?2",
            params![description, to_sql_id(id)?],
        )?;
        Ok(())
    }

    pub fn description(&self, id: PhotoId) -> Result<Option<String>> {
        let conn = self.lock()?;
        let description = conn
            .query_row(
                "SELECT description FROM list_entries WHERE id = ?1",
                params![to_sql_id(id)?],
                |row| row.get(0),
            )
            .optional()?;
        Ok(description)
    }

    pub fn load_entries(&self) -> Result<Vec<ListEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, rover_name, camera_name, camera_full_name, earth_date, sol, img_src, description
             FROM list_entries
             ORDER BY position ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<u32>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, rover_name, camera_name, camera_full_name, earth_date, sol, img_src, description) =
                row?;
            let earth_date = NaiveDate::parse_from_str(&earth_date, DATE_FORMAT)
                .with_context(|| format!("bad earth_date {earth_date:?} for photo {id}"))?;
            entries.push(ListEntry {
                photo: Photo {
                    id: PhotoId::try_from(id).with_context(|| format!("negative photo id {id}"))?,
                    sol,
                    camera: Camera {
                        name: camera_name,
                        full_name: camera_full_name,
                    },
                    img_src,
                    earth_date,
                    rover: RoverRef { name: rover_name },
                },
                description,
            });
        }

        Ok(entries)
    }
}

fn to_sql_id(id: PhotoId) -> Result<i64> {
    i64::try_from(id).map_err(|_| anyhow!("photo id {id} does not fit in SQLite"))
}
