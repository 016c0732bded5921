use anyhow::Result;

use super::schema::Database;
use crate::cache::{KvStore, StoreError};

impl Database {
    // ========================================================================
    // Key/Value Operations
    // ========================================================================

    /// Get a stored value by key.
    ///
    /// # Returns
    ///
    /// The raw value if the key exists, or `None` if not set.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a value (UPSERT).
    ///
    /// Inserts the key-value pair if it doesn't exist, or replaces the value
    /// and timestamp if the key already exists.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a key. Deleting a missing key is not an error.
    pub async fn delete_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl KvStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get_value(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set_value(key, value)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.delete_value(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_value_missing() {
        let db = test_db().await;
        let value = db.get_value("nonexistent").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_and_get_value() {
        let db = test_db().await;
        db.set_value("catalog", "{}").await.unwrap();

        let value = db.get_value("catalog").await.unwrap();
        assert_eq!(value, Some("{}".to_string()));
    }

    #[tokio::test]
    async fn test_set_value_upsert() {
        let db = test_db().await;
        db.set_value("catalog", "old").await.unwrap();
        db.set_value("catalog", "new").await.unwrap();

        let value = db.get_value("catalog").await.unwrap();
        assert_eq!(value, Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_delete_value() {
        let db = test_db().await;
        db.set_value("catalog", "{}").await.unwrap();
        db.delete_value("catalog").await.unwrap();

        assert_eq!(db.get_value("catalog").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_value_is_ok() {
        let db = test_db().await;
        assert!(db.delete_value("never-written").await.is_ok());
    }

    #[tokio::test]
    async fn test_set_value_updates_timestamp() {
        let db = test_db().await;
        db.set_value("test.key", "value1").await.unwrap();

        let row: (String,) = sqlx::query_as("SELECT updated_at FROM kv_store WHERE key = ?")
            .bind("test.key")
            .fetch_one(&db.pool)
            .await
            .unwrap();

        assert!(!row.0.is_empty());
    }
}
