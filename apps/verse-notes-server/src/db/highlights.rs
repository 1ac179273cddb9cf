//! Highlights database operations

use chrono::Utc;
use sqlx::SqlitePool;
use verse_notes::{Annotation, Scope};

use crate::error::{AppError, Result};

/// Highlight row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HighlightRow {
    pub id: String,
    pub kind: String,
    pub verse_id: String,
    pub start_offset: i64,
    pub end_offset: i64,
    pub note: Option<String>,
    pub translation: String,
    pub book_id: i64,
    pub chapter: i64,
    pub created_at: String,
}

impl HighlightRow {
    /// Convert the row into the wire annotation
    pub fn into_annotation(self) -> Result<Annotation> {
        let corrupt = |field: &str| AppError::Internal(format!("Corrupt {} in row {}", field, self.id));

        Ok(Annotation {
            kind: self.kind.parse().map_err(|_| corrupt("type"))?,
            start: usize::try_from(self.start_offset).map_err(|_| corrupt("start"))?,
            end: usize::try_from(self.end_offset).map_err(|_| corrupt("end"))?,
            book_id: u32::try_from(self.book_id).map_err(|_| corrupt("book_id"))?,
            chapter: u32::try_from(self.chapter).map_err(|_| corrupt("chapter"))?,
            anchor_id: self.verse_id,
            note: self.note,
            translation: self.translation,
            id: self.id,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, type AS kind, verse_id, start_offset, end_offset, note,
           translation, book_id, chapter, created_at
    FROM highlights
"#;

/// Highlight repository
pub struct HighlightRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HighlightRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a specific highlight
    pub async fn get(&self, id: &str) -> Result<Option<Annotation>> {
        let row = sqlx::query_as::<_, HighlightRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(HighlightRow::into_annotation).transpose()
    }

    /// List highlights of one chapter in insertion order
    pub async fn list_for_scope(&self, scope: &Scope) -> Result<Vec<Annotation>> {
        let rows = sqlx::query_as::<_, HighlightRow>(&format!(
            "{} WHERE translation = ? AND book_id = ? AND chapter = ? ORDER BY rowid ASC",
            SELECT_COLUMNS
        ))
        .bind(&scope.translation)
        .bind(scope.book_id)
        .bind(scope.chapter)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(HighlightRow::into_annotation).collect()
    }

    /// Insert a new highlight; an existing id is a conflict and nothing is written
    pub async fn insert(&self, annotation: &Annotation) -> Result<Annotation> {
        let offset = |value: usize, field: &str| {
            i64::try_from(value)
                .map_err(|_| AppError::BadRequest(format!("{} offset out of range: {}", field, value)))
        };
        let start = offset(annotation.start, "start")?;
        let end = offset(annotation.end, "end")?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO highlights (id, type, verse_id, start_offset, end_offset, note,
                                    translation, book_id, chapter, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&annotation.id)
        .bind(annotation.kind.as_str())
        .bind(&annotation.anchor_id)
        .bind(start)
        .bind(end)
        .bind(&annotation.note)
        .bind(&annotation.translation)
        .bind(annotation.book_id)
        .bind(annotation.chapter)
        .bind(&now)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Highlight already exists: {}", annotation.id))
            }
            other => AppError::Database(other),
        })?;

        self.get(&annotation.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created highlight".to_string()))
    }

    /// Delete a highlight, reporting whether a row was removed
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM highlights WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all stored highlights
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM highlights")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_in_memory_pool;
    use verse_notes::{AnnotationKind, Location};

    fn annotation(id: &str, scope: &Scope, verse: u32, start: usize, end: usize) -> Annotation {
        let mut a = Annotation::new(
            AnnotationKind::Highlight,
            Location::new(scope.anchor(verse).to_string(), start, end),
            scope,
            None,
        );
        a.id = id.to_string();
        a
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let pool = create_in_memory_pool().await.unwrap();
        let repo = HighlightRepository::new(&pool);
        let scope = Scope::new("KJV", 43, 3);

        let mut note = annotation("n-1", &scope, 16, 0, 8);
        note.kind = AnnotationKind::Note;
        note.note = Some("For God so loved".to_string());

        let stored = repo.insert(&note).await.unwrap();
        assert_eq!(stored, note);
        assert_eq!(repo.get("n-1").await.unwrap(), Some(note));
        assert_eq!(repo.get("n-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_filters_scope_and_keeps_insertion_order() {
        let pool = create_in_memory_pool().await.unwrap();
        let repo = HighlightRepository::new(&pool);
        let john3 = Scope::new("KJV", 43, 3);

        // Ids deliberately out of lexical order
        repo.insert(&annotation("h-c", &john3, 16, 0, 3)).await.unwrap();
        repo.insert(&annotation("h-a", &john3, 1, 0, 3)).await.unwrap();
        repo.insert(&annotation("h-x", &Scope::new("NIV", 43, 3), 16, 0, 3))
            .await
            .unwrap();
        repo.insert(&annotation("h-y", &Scope::new("KJV", 43, 4), 1, 0, 3))
            .await
            .unwrap();
        repo.insert(&annotation("h-b", &john3, 16, 4, 8)).await.unwrap();

        let ids: Vec<String> = repo
            .list_for_scope(&john3)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["h-c", "h-a", "h-b"]);

        assert!(repo
            .list_for_scope(&Scope::new("KJV", 1, 1))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts_without_overwrite() {
        let pool = create_in_memory_pool().await.unwrap();
        let repo = HighlightRepository::new(&pool);
        let scope = Scope::new("KJV", 1, 1);

        let original = annotation("h-1", &scope, 1, 0, 2);
        repo.insert(&original).await.unwrap();

        let duplicate = annotation("h-1", &scope, 2, 5, 9);
        let err = repo.insert(&duplicate).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.get("h-1").await.unwrap(), Some(original));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_offsets_beyond_column_range_are_rejected() {
        let pool = create_in_memory_pool().await.unwrap();
        let repo = HighlightRepository::new(&pool);
        let scope = Scope::new("KJV", 1, 1);

        let huge = 1usize << 63;
        let err = repo
            .insert(&annotation("h-big", &scope, 1, huge, huge + 1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let pool = create_in_memory_pool().await.unwrap();
        let repo = HighlightRepository::new(&pool);
        let scope = Scope::new("KJV", 1, 1);

        repo.insert(&annotation("h-1", &scope, 1, 0, 2)).await.unwrap();

        assert!(repo.delete("h-1").await.unwrap());
        assert!(!repo.delete("h-1").await.unwrap());
        assert!(!repo.delete("h-12345").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("notes.db").display());
        let scope = Scope::new("KJV", 1, 1);

        {
            let pool = crate::db::create_pool(&url, 2).await.unwrap();
            HighlightRepository::new(&pool)
                .insert(&annotation("h-1", &scope, 1, 0, 2))
                .await
                .unwrap();
            pool.close().await;
        }

        let pool = crate::db::create_pool(&url, 2).await.unwrap();
        let listed = HighlightRepository::new(&pool)
            .list_for_scope(&scope)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "h-1");
    }
}
