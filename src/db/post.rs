//! Post storage. Posts are owned through their parent blog.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

/// A full post with its parent blog and the blog owner's ID.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub uuid: String,
    pub blog_id: i64,
    pub blog_uuid: String,
    pub owner_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A summary of a post for listing (without content).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostSummary {
    pub uuid: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

const SELECT_POST: &str = "SELECT p.id, p.uuid, p.blog_id, b.uuid AS blog_uuid, b.created_by AS owner_id,
            p.title, p.content, p.created_at, p.updated_at
     FROM posts p JOIN blogs b ON b.id = p.blog_id";

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post in a blog. Returns the stored post.
    pub async fn create(&self, blog_id: i64, title: &str, content: &str) -> Result<Post, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO posts (uuid, blog_id, title, content) VALUES (?, ?, ?, ?)")
            .bind(&uuid)
            .bind(blog_id)
            .bind(title)
            .bind(content)
            .execute(&mut *tx)
            .await?;

        let post: Post = sqlx::query_as(&format!("{} WHERE p.uuid = ?", SELECT_POST))
            .bind(&uuid)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(post)
    }

    /// Get a post by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as(&format!("{} WHERE p.uuid = ?", SELECT_POST))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
    }

    /// List posts of a blog, oldest first.
    pub async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<PostSummary>, sqlx::Error> {
        sqlx::query_as(
            "SELECT uuid, title, created_at, updated_at FROM posts WHERE blog_id = ? ORDER BY id",
        )
        .bind(blog_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Titles of all posts in a blog, oldest first.
    pub async fn titles_by_blog(&self, blog_id: i64) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT title FROM posts WHERE blog_id = ? ORDER BY id")
                .bind(blog_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(title,)| title).collect())
    }

    /// Delete a post if its blog is owned by `owner_id`. Returns true if a row was deleted.
    pub async fn delete_owned(&self, uuid: &str, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM posts WHERE uuid = ? AND blog_id IN (SELECT id FROM blogs WHERE created_by = ?)",
        )
        .bind(uuid)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
