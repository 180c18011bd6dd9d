use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS members (
            id              TEXT PRIMARY KEY,
            display_name    TEXT NOT NULL,
            ignored         INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS occurrences (
            post_id         TEXT PRIMARY KEY,
            event_date      TEXT NOT NULL UNIQUE,
            channel_id      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS attendance (
            member_id       TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            post_id         TEXT NOT NULL REFERENCES occurrences(post_id),
            present         INTEGER,
            PRIMARY KEY (member_id, post_id)
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_post
            ON attendance(post_id);

        CREATE INDEX IF NOT EXISTS idx_members_display_name
            ON members(display_name);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
