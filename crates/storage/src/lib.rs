use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, warn};

use shared::domain::{Card, CardId, CardUpdate, NewCard, WordType};

/// Order in which cards are listed by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first; the study view walks cards in this order.
    Ascending,
    /// Newest first; the list view shows cards in this order.
    #[default]
    Descending,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ORDER BY created_at ASC, id ASC",
            SortOrder::Descending => "ORDER BY created_at DESC, id DESC",
        }
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // An in-memory database only lives as long as its connection.
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_card(&self, card: NewCard) -> Result<Card> {
        let card = card.validated()?;
        let created_at = Utc::now();
        let rec = sqlx::query(
            "INSERT INTO cards (word, definition, word_type, word_type_abbreviation, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&card.word)
        .bind(&card.definition)
        .bind(card.word_type.map(WordType::as_str))
        .bind(card.word_type.map(WordType::abbreviation))
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert card")?;
        let id = CardId(rec.get::<i64, _>(0));
        debug!(card_id = id.0, word = %card.word, "inserted card");

        Ok(Card {
            id,
            word: card.word,
            definition: card.definition,
            word_type: card.word_type,
            created_at,
        })
    }

    pub async fn get_card(&self, id: CardId) -> Result<Option<Card>> {
        let row = sqlx::query(
            "SELECT id, word, definition, word_type, created_at FROM cards WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load card {id}"))?;
        row.as_ref().map(card_from_row).transpose()
    }

    pub async fn list_cards(&self, order: SortOrder) -> Result<Vec<Card>> {
        let sql = format!(
            "SELECT id, word, definition, word_type, created_at FROM cards {}",
            order.sql()
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list cards")?;
        rows.iter().map(card_from_row).collect()
    }

    pub async fn count_cards(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards")
            .fetch_one(&self.pool)
            .await
            .context("failed to count cards")?;
        Ok(count)
    }

    /// Applies `update` in place. Returns `None` if the card does not exist.
    pub async fn update_card(&self, id: CardId, update: CardUpdate) -> Result<Option<Card>> {
        let Some(existing) = self.get_card(id).await? else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(existing));
        }

        let merged = NewCard {
            word: update.word.unwrap_or(existing.word),
            definition: update.definition.unwrap_or(existing.definition),
            word_type: update.word_type.unwrap_or(existing.word_type),
        }
        .validated()?;

        sqlx::query(
            "UPDATE cards
             SET word = ?, definition = ?, word_type = ?, word_type_abbreviation = ?
             WHERE id = ?",
        )
        .bind(&merged.word)
        .bind(&merged.definition)
        .bind(merged.word_type.map(WordType::as_str))
        .bind(merged.word_type.map(WordType::abbreviation))
        .bind(id.0)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update card {id}"))?;
        debug!(card_id = id.0, "updated card");

        Ok(Some(Card {
            id,
            word: merged.word,
            definition: merged.definition,
            word_type: merged.word_type,
            created_at: existing.created_at,
        }))
    }

    pub async fn delete_card(&self, id: CardId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete card {id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn card_from_row(row: &SqliteRow) -> Result<Card> {
    let id = CardId(row.try_get::<i64, _>("id")?);
    let raw_word_type: Option<String> = row.try_get("word_type")?;
    let word_type = raw_word_type.and_then(|raw| match raw.parse::<WordType>() {
        Ok(word_type) => Some(word_type),
        Err(error) => {
            warn!(card_id = id.0, %error, "ignoring stored word type");
            None
        }
    });
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Card {
        id,
        word: row.try_get("word")?,
        definition: row.try_get("definition")?,
        word_type,
        created_at,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
