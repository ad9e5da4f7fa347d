//! Blog storage, scoped by owner.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct BlogStore {
    pool: SqlitePool,
}

/// A blog joined with its owner's username.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Blog {
    pub id: i64,
    pub uuid: String,
    pub title: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub owner: String,
    pub created_at: String,
}

const SELECT_BLOG: &str = "SELECT b.id, b.uuid, b.title, b.description, b.created_by, u.username AS owner, b.created_at
     FROM blogs b JOIN users u ON u.id = b.created_by";

impl BlogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new blog owned by `created_by`. Returns the stored blog.
    pub async fn create(
        &self,
        created_by: i64,
        title: &str,
        description: Option<&str>,
    ) -> Result<Blog, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO blogs (uuid, title, description, created_by) VALUES (?, ?, ?, ?)")
            .bind(&uuid)
            .bind(title)
            .bind(description)
            .bind(created_by)
            .execute(&mut *tx)
            .await?;

        let blog: Blog = sqlx::query_as(&format!("{} WHERE b.uuid = ?", SELECT_BLOG))
            .bind(&uuid)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(blog)
    }

    /// Get a blog by its public UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Blog>, sqlx::Error> {
        sqlx::query_as(&format!("{} WHERE b.uuid = ?", SELECT_BLOG))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
    }

    /// List all blogs owned by a user, oldest first.
    pub async fn list_by_owner(&self, created_by: i64) -> Result<Vec<Blog>, sqlx::Error> {
        sqlx::query_as(&format!(
            "{} WHERE b.created_by = ? ORDER BY b.created_at, b.id",
            SELECT_BLOG
        ))
        .bind(created_by)
        .fetch_all(&self.pool)
        .await
    }

    /// Check whether the owner has no blog with this title yet.
    pub async fn is_title_available(
        &self,
        created_by: i64,
        title: &str,
    ) -> Result<bool, sqlx::Error> {
        let count: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM blogs WHERE created_by = ? AND title = ?")
                .bind(created_by)
                .bind(title)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 == 0)
    }

    /// Delete a blog if it is owned by `created_by`. Returns true if a row was deleted.
    pub async fn delete_owned(&self, uuid: &str, created_by: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blogs WHERE uuid = ? AND created_by = ?")
            .bind(uuid)
            .bind(created_by)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
