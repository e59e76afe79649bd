use crate::domain::{Giveaway, GiveawayStats, Participant, Ticket, TicketCategory, TopEntry};
use crate::error::{GiveawayError, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

/// The authoritative store of giveaways, users, referrals and tickets.
///
/// Nothing else touches these tables; every other component reads through
/// this query surface. Uniqueness rules live in the schema itself, so a
/// check-then-insert race from two concurrent submissions collapses into a
/// constraint conflict instead of a double grant.
pub struct TicketLedger {
    conn: Connection,
}

impl TicketLedger {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS giveaways (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                start_time  INTEGER NOT NULL,
                end_time    INTEGER,
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_by  INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS users (
                user_id    INTEGER PRIMARY KEY,
                handle     TEXT,
                joined_at  INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS referrals (
                referrer_id  INTEGER NOT NULL,
                referred_id  INTEGER NOT NULL,
                giveaway_id  INTEGER NOT NULL,
                PRIMARY KEY (referrer_id, referred_id, giveaway_id)
            );
            CREATE TABLE IF NOT EXISTS tickets (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id      INTEGER NOT NULL,
                giveaway_id  INTEGER NOT NULL,
                category     TEXT NOT NULL CHECK (category IN ('base', 'referral', 'video')),
                source_url   TEXT,
                verified     INTEGER NOT NULL DEFAULT 1
            );
            CREATE UNIQUE INDEX IF NOT EXISTS tickets_once_per_category
                ON tickets (user_id, giveaway_id, category)
                WHERE category != 'referral';
            "#,
        )?;
        Ok(())
    }

    /// The single running giveaway, if any. At most one row is active; the
    /// transition operations keep it that way transactionally.
    pub fn active_giveaway(&self) -> Result<Option<Giveaway>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, start_time, end_time, is_active, created_by
                 FROM giveaways WHERE is_active = 1",
                [],
                |row| {
                    Ok(Giveaway {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        start_time: row.get(2)?,
                        end_time: row.get(3)?,
                        is_active: row.get::<_, i64>(4)? != 0,
                        created_by: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Number of rows currently flagged active. The transition operations
    /// keep this at zero or one; exposed for auditing.
    pub fn active_giveaway_count(&self) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM giveaways WHERE is_active = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Idempotent user upsert. The first-seen timestamp is written once and
    /// never touched again; the handle refreshes when the platform has one.
    pub fn record_user(&self, user_id: i64, handle: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (user_id, handle, joined_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET handle = COALESCE(excluded.handle, handle)",
            params![user_id, handle, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn participant(&self, user_id: i64) -> Result<Option<Participant>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, handle, joined_at FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Participant {
                        user_id: row.get(0)?,
                        handle: row.get(1)?,
                        joined_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Grants the joining ticket; a repeat join is a no-op. Returns whether a
    /// ticket was actually inserted.
    pub fn grant_base_ticket(&self, user_id: i64, giveaway_id: i64) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO tickets (user_id, giveaway_id, category) VALUES (?1, ?2, 'base')",
            params![user_id, giveaway_id],
        )?;
        if inserted == 1 {
            debug!("Granted base ticket to user {user_id} for giveaway {giveaway_id}");
        }
        Ok(inserted == 1)
    }

    /// Records a referral fact, idempotent on the (referrer, referred,
    /// giveaway) triple. Only the first insertion credits the referrer with a
    /// referral ticket, so repeat joins by the same referred user never stack.
    pub fn record_referral(&mut self, referrer_id: i64, referred_id: i64, giveaway_id: i64) -> Result<bool> {
        if referrer_id == referred_id {
            return Ok(false);
        }
        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO referrals (referrer_id, referred_id, giveaway_id) VALUES (?1, ?2, ?3)",
            params![referrer_id, referred_id, giveaway_id],
        )?;
        if inserted == 1 {
            tx.execute(
                "INSERT INTO tickets (user_id, giveaway_id, category) VALUES (?1, ?2, 'referral')",
                params![referrer_id, giveaway_id],
            )?;
            info!("User {referred_id} joined via referral from {referrer_id}, +1 ticket");
        }
        tx.commit()?;
        Ok(inserted == 1)
    }

    pub fn has_video_ticket(&self, user_id: i64, giveaway_id: i64) -> Result<bool> {
        Ok(self.video_ticket(user_id, giveaway_id)?.is_some())
    }

    /// The full video-ticket row, with the submitted URL, for audits.
    pub fn video_ticket(&self, user_id: i64, giveaway_id: i64) -> Result<Option<Ticket>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, user_id, giveaway_id, category, source_url, verified
                 FROM tickets WHERE user_id = ?1 AND giveaway_id = ?2 AND category = 'video'",
                params![user_id, giveaway_id],
                Self::ticket_from_row,
            )
            .optional()?;
        Ok(row)
    }

    fn ticket_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
        let category: String = row.get(3)?;
        Ok(Ticket {
            id: row.get(0)?,
            user_id: row.get(1)?,
            giveaway_id: row.get(2)?,
            category: TicketCategory::parse(&category).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(3, "category".into(), rusqlite::types::Type::Text)
            })?,
            source_url: row.get(4)?,
            verified: row.get::<_, i64>(5)? != 0,
        })
    }

    /// Grants the one-per-giveaway video ticket. A second grant for the same
    /// (user, giveaway) trips the unique index and is reported as a duplicate
    /// submission, covering the race where two submissions pass the duplicate
    /// check before either inserts.
    pub fn grant_video_ticket(&self, user_id: i64, giveaway_id: i64, url: &str) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO tickets (user_id, giveaway_id, category, source_url) VALUES (?1, ?2, 'video', ?3)",
            params![user_id, giveaway_id, url],
        );
        match result {
            Ok(_) => {
                info!("Granted video ticket to user {user_id} for giveaway {giveaway_id}");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(GiveawayError::DuplicateSubmission)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Administrative override; removes 0 or 1 tickets and says which.
    pub fn revoke_video_ticket(&self, user_id: i64, giveaway_id: i64) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM tickets WHERE user_id = ?1 AND giveaway_id = ?2 AND category = 'video'",
            params![user_id, giveaway_id],
        )?;
        if removed > 0 {
            info!("Revoked video ticket of user {user_id} for giveaway {giveaway_id}");
        }
        Ok(removed)
    }

    /// Per-user ticket counts for a giveaway; the raw material of the draw pool.
    pub fn ticket_counts(&self, giveaway_id: i64) -> Result<Vec<(i64, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, COUNT(*) FROM tickets WHERE giveaway_id = ?1 GROUP BY user_id",
        )?;
        let rows = stmt
            .query_map(params![giveaway_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn user_ticket_count(&self, user_id: i64, giveaway_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM tickets WHERE user_id = ?1 AND giveaway_id = ?2",
            params![user_id, giveaway_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Distinct referred users credited to a referrer in this giveaway.
    pub fn referral_count(&self, referrer_id: i64, giveaway_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM referrals WHERE referrer_id = ?1 AND giveaway_id = ?2",
            params![referrer_id, giveaway_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn distinct_participants(&self, giveaway_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM tickets WHERE giveaway_id = ?1",
            params![giveaway_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn total_tickets(&self, giveaway_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM tickets WHERE giveaway_id = ?1",
            params![giveaway_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn video_ticket_count(&self, giveaway_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM tickets WHERE giveaway_id = ?1 AND category = 'video'",
            params![giveaway_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn stats(&self, giveaway_id: i64) -> Result<GiveawayStats> {
        Ok(GiveawayStats {
            participants: self.distinct_participants(giveaway_id)?,
            total_tickets: self.total_tickets(giveaway_id)?,
            video_tickets: self.video_ticket_count(giveaway_id)?,
        })
    }

    /// Participants ordered by ticket count, for the admin top list.
    pub fn top_participants(&self, giveaway_id: i64, limit: usize) -> Result<Vec<TopEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.user_id, u.handle, COUNT(*) AS tickets
             FROM tickets t
             LEFT JOIN users u ON t.user_id = u.user_id
             WHERE t.giveaway_id = ?1
             GROUP BY t.user_id
             ORDER BY tickets DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![giveaway_id, limit as i64], |row| {
                Ok(TopEntry {
                    user_id: row.get(0)?,
                    handle: row.get(1)?,
                    tickets: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Starts a new giveaway now, for `duration_hours`.
    pub fn create_giveaway(&mut self, name: &str, duration_hours: i64, created_by: i64) -> Result<Giveaway> {
        self.create_giveaway_at(name, Utc::now().timestamp(), duration_hours, created_by)
    }

    /// Deactivate-then-insert runs in one transaction: a concurrent reader of
    /// `active_giveaway` sees either the old giveaway or the new one, never
    /// zero or two.
    pub fn create_giveaway_at(
        &mut self,
        name: &str,
        start_time: i64,
        duration_hours: i64,
        created_by: i64,
    ) -> Result<Giveaway> {
        let end_time = start_time + duration_hours * 3600;
        let tx = self.conn.transaction()?;
        tx.execute("UPDATE giveaways SET is_active = 0 WHERE is_active = 1", [])?;
        tx.execute(
            "INSERT INTO giveaways (name, start_time, end_time, is_active, created_by)
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![name, start_time, end_time, created_by],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        info!("Giveaway '{name}' ({id}) started, running for {duration_hours}h");
        Ok(Giveaway {
            id,
            name: name.to_string(),
            start_time,
            end_time: Some(end_time),
            is_active: true,
            created_by,
        })
    }

    pub fn deactivate(&self, giveaway_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE giveaways SET is_active = 0 WHERE id = ?1",
            params![giveaway_id],
        )?;
        Ok(())
    }

    /// Deactivates whatever is running; returns how many rows changed so the
    /// caller can tell "cancelled" from "nothing to cancel".
    pub fn deactivate_active(&self) -> Result<usize> {
        let changed = self
            .conn
            .execute("UPDATE giveaways SET is_active = 0 WHERE is_active = 1", [])?;
        Ok(changed)
    }
}
