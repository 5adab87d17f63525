use rusqlite::{Connection, Row, params};
use tracing::info;

use crate::models::{LikeRow, MessageRow, NewMessage, NewUser, UserRow, UserStats};
use crate::{Database, DbError, Result};

const USER_COLUMNS: &str =
    "id, email, username, image_url, header_image_url, bio, location, password";

const MESSAGE_SELECT: &str = "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
     FROM messages m
     JOIN users u ON m.user_id = u.id";

impl Database {
    // -- Users --

    pub fn insert_user(&self, user: &NewUser) -> Result<UserRow> {
        let row = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, image_url)
                 VALUES (?1, ?2, ?3, ?4, COALESCE(?5, '/static/images/default-pic.png'))",
                params![user.id, user.username, user.email, user.password, user.image_url],
            )?;
            let id = conn.last_insert_rowid();
            query_user(conn, "id = ?1", id)?
                .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        })?;

        info!("Created user #{} ({})", row.id, row.username);
        Ok(row)
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    /// All users, or those whose username contains `search`.
    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let pattern = format!("%{}%", search.unwrap_or_default());
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username LIKE ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([pattern], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Removes the user; messages, follows and likes go with it.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let deleted = self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(n > 0)
        })?;

        if deleted {
            info!("Deleted user #{}", id);
        }
        Ok(deleted)
    }

    pub fn user_stats(&self, user_id: i64) -> Result<UserStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_following_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [user_id],
                |row| {
                    Ok(UserStats {
                        messages: row.get(0)?,
                        following: row.get(1)?,
                        followers: row.get(2)?,
                        likes: row.get(3)?,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &NewMessage) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, text, user_id) VALUES (?1, ?2, ?3)",
                params![message.id, message.text, message.user_id],
            )?;
            let id = conn.last_insert_rowid();
            query_message(conn, id)?
                .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Newest first.
    pub fn user_messages(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "WHERE m.user_id = ?1 ORDER BY m.timestamp DESC, m.id DESC LIMIT ?2",
                params![user_id, limit],
            )
        })
    }

    /// Messages by `user_id` and everyone they follow, newest first.
    pub fn timeline(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1)
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2",
                params![user_id, limit],
            )
        })
    }

    // -- Follows --

    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)",
                [followed_id, follower_id],
            )?;
            Ok(())
        })
    }

    /// Follow unless already following, as one statement. Returns whether a
    /// new edge was created.
    pub fn follow_once(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id)
                 VALUES (?1, ?2)",
                [followed_id, follower_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
                [followed_id, follower_id],
            )?;
            Ok(n > 0)
        })
    }

    /// Does `user_id` follow `other_id`?
    pub fn is_following(&self, user_id: i64, other_id: i64) -> Result<bool> {
        self.with_conn(|conn| follow_exists(conn, user_id, other_id))
    }

    /// Is `user_id` followed by `other_id`?
    pub fn is_followed_by(&self, user_id: i64, other_id: i64) -> Result<bool> {
        self.with_conn(|conn| follow_exists(conn, other_id, user_id))
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                "JOIN follows f ON f.user_being_followed_id = users.id
                 WHERE f.user_following_id = ?1",
                user_id,
            )
        })
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                "JOIN follows f ON f.user_following_id = users.id
                 WHERE f.user_being_followed_id = ?1",
                user_id,
            )
        })
    }

    // -- Likes --

    pub fn like(&self, user_id: i64, message_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                [user_id, message_id],
            )?;
            Ok(())
        })
    }

    pub fn unlike(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                [user_id, message_id],
            )?;
            Ok(n > 0)
        })
    }

    /// Toggle a like: removes if present, inserts if not.
    /// Returns whether the message is liked afterwards.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM likes WHERE user_id = ?1 AND message_id = ?2",
                    [user_id, message_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = if let Some(id) = existing {
                tx.execute("DELETE FROM likes WHERE id = ?1", [id])?;
                false
            } else {
                tx.execute(
                    "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                    [user_id, message_id],
                )?;
                true
            };
            tx.commit()?;
            Ok(liked)
        })
    }

    pub fn likes_for_message(&self, message_id: i64) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| query_likes(conn, "message_id = ?1", message_id))
    }

    pub fn likes_for_user(&self, user_id: i64) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| query_likes(conn, "user_id = ?1", user_id))
    }

    pub fn liked_messages(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "JOIN likes l ON l.message_id = m.id
                 WHERE l.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC",
                [user_id],
            )
        })
    }

    pub fn liked_message_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT message_id FROM likes WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password: row.get(7)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        username: row.get(4)?,
        image_url: row.get(5)?,
    })
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, filter: &str, value: P) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}"))?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn query_users(conn: &Connection, clause: &str, id: i64) -> Result<Vec<UserRow>> {
    let columns = USER_COLUMNS
        .split(", ")
        .map(|c| format!("users.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM users {clause} ORDER BY users.id"
    ))?;
    let rows = stmt
        .query_map([id], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(&format!("{MESSAGE_SELECT} WHERE m.id = ?1"))?;
    let row = stmt.query_row([id], message_from_row).optional()?;
    Ok(row)
}

fn query_messages<P: rusqlite::Params>(
    conn: &Connection,
    clause: &str,
    params: P,
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(&format!("{MESSAGE_SELECT} {clause}"))?;
    let rows = stmt
        .query_map(params, message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_likes(conn: &Connection, filter: &str, id: i64) -> Result<Vec<LikeRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, user_id, message_id FROM likes WHERE {filter} ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([id], |row| {
            Ok(LikeRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                message_id: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn follow_exists(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM follows WHERE user_following_id = ?1 AND user_being_followed_id = ?2",
            [follower_id, followed_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
