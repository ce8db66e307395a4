//! Posts table access.
//!
//! Thin CRUD helpers over the `tbl_posts` demonstration table. Every
//! statement goes through the connection handle, so the usual binding
//! validation and query logging apply here like everywhere else.

use crate::core::db::{ConnectionHandle, Params, Row};
use crate::core::{MiniblogError, Result};

const POSTS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS tbl_posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    image TEXT,
    posts_categories_id INTEGER NOT NULL DEFAULT 1,
    is_archive BOOLEAN NOT NULL DEFAULT 0,
    status INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)"#;

/// A stored post as read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub category_id: i64,
    pub is_archived: bool,
    pub status: i64,
    pub created_at: String,
}

impl Post {
    /// Decodes a post from a `tbl_posts` row.
    pub fn from_row(row: &Row) -> Result<Post> {
        Ok(Post {
            id: require_i64(row, "id")?,
            title: require_str(row, "title")?.to_string(),
            content: require_str(row, "content")?.to_string(),
            image: row.get_str("image").map(String::from),
            category_id: require_i64(row, "posts_categories_id")?,
            is_archived: require_i64(row, "is_archive")? != 0,
            status: require_i64(row, "status")?,
            created_at: require_str(row, "created_at")?.to_string(),
        })
    }
}

/// Field set for creating or rewriting a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub category_id: i64,
    pub is_archived: bool,
    pub status: i64,
}

impl NewPost {
    /// A visible, uncategorized post with the given title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        NewPost {
            title: title.into(),
            content: content.into(),
            image: None,
            category_id: 1,
            is_archived: false,
            status: 1,
        }
    }
}

/// Creates `tbl_posts` if it does not exist yet.
pub fn ensure_schema(handle: &mut ConnectionHandle) -> Result<()> {
    handle.execute(POSTS_TABLE_SQL, &Params::new())?;
    Ok(())
}

/// Inserts a post and returns its generated id.
pub fn create(handle: &mut ConnectionHandle, post: &NewPost) -> Result<i64> {
    let params = Params::new()
        .set("title", post.title.as_str())
        .set("content", post.content.as_str())
        .set("image", post.image.clone())
        .set("posts_categories_id", post.category_id)
        .set("is_archive", post.is_archived)
        .set("status", post.status);

    let result = handle.execute(
        "INSERT INTO tbl_posts (title, content, image, posts_categories_id, is_archive, status) \
         VALUES (:title, :content, :image, :posts_categories_id, :is_archive, :status)",
        &params,
    )?;

    result
        .last_insert_id()
        .ok_or_else(|| MiniblogError::Query("Insert reported no generated id".to_string()))
}

/// Looks a post up by id.
pub fn find(handle: &mut ConnectionHandle, id: i64) -> Result<Option<Post>> {
    let result = handle.execute(
        "SELECT * FROM tbl_posts WHERE id = :id",
        &Params::new().set("id", id),
    )?;
    result.single_row().map(Post::from_row).transpose()
}

/// All posts ordered by id.
pub fn list(handle: &mut ConnectionHandle) -> Result<Vec<Post>> {
    let rows = handle.query_all("SELECT * FROM tbl_posts ORDER BY id")?;
    rows.iter().map(Post::from_row).collect()
}

/// Posts that have not been archived, ordered by id.
pub fn list_active(handle: &mut ConnectionHandle) -> Result<Vec<Post>> {
    let rows = handle.query_all("SELECT * FROM tbl_posts WHERE is_archive = 0 ORDER BY id")?;
    rows.iter().map(Post::from_row).collect()
}

/// Rewrites every editable field of the post with the given id. Returns the
/// number of rows changed (zero when the id does not exist).
pub fn update(handle: &mut ConnectionHandle, id: i64, post: &NewPost) -> Result<usize> {
    let params = Params::new()
        .set("id", id)
        .set("title", post.title.as_str())
        .set("content", post.content.as_str())
        .set("image", post.image.clone())
        .set("posts_categories_id", post.category_id)
        .set("is_archive", post.is_archived)
        .set("status", post.status);

    let result = handle.execute(
        "UPDATE tbl_posts SET title = :title, content = :content, image = :image, \
         posts_categories_id = :posts_categories_id, is_archive = :is_archive, status = :status \
         WHERE id = :id",
        &params,
    )?;
    Ok(result.affected_rows())
}

/// Marks the post with the given id as archived.
pub fn archive(handle: &mut ConnectionHandle, id: i64) -> Result<usize> {
    let result = handle.execute(
        "UPDATE tbl_posts SET is_archive = 1 WHERE id = :id",
        &Params::new().set("id", id),
    )?;
    Ok(result.affected_rows())
}

/// Deletes the post with the given id.
pub fn delete(handle: &mut ConnectionHandle, id: i64) -> Result<usize> {
    let result = handle.execute(
        "DELETE FROM tbl_posts WHERE id = :id",
        &Params::new().set("id", id),
    )?;
    Ok(result.affected_rows())
}

fn require_i64(row: &Row, column: &str) -> Result<i64> {
    row.get_i64(column).ok_or_else(|| {
        MiniblogError::Query(format!("Row is missing integer column '{}'", column))
    })
}

fn require_str<'a>(row: &'a Row, column: &str) -> Result<&'a str> {
    row.get_str(column)
        .ok_or_else(|| MiniblogError::Query(format!("Row is missing text column '{}'", column)))
}
