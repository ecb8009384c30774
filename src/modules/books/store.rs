use shelf_db::{Db, Page};

use super::models::{Book, BookInput, BookSort};

/// Rows per list page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

const SELECT_COLUMNS: &str = "SELECT id, name, author, publish_date, description FROM book";

/// Parameterized SQL over the `book` table. Cheap to clone; carries only
/// the pool handle.
#[derive(Clone)]
pub struct BookStore {
    db: Db,
}

impl BookStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Look up exactly one row. Absence is a `None`, never an error.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Book>, sqlx::Error> {
        sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// Fetch one page of rows whose name matches `filter` (a LIKE pattern,
    /// wildcards included by the caller) plus the total match count.
    pub async fn list(
        &self,
        page: u32,
        page_size: u32,
        sort: BookSort,
        filter: &str,
    ) -> Result<Page<Book>, sqlx::Error> {
        let offset = i64::from(page) * i64::from(page_size);

        // `sort.column()` comes from the allow-list enum, so the only
        // dynamic piece of this statement is a known column name.
        let sql = format!(
            "{SELECT_COLUMNS} WHERE name LIKE ?1 ORDER BY {column} NULLS LAST LIMIT ?2 OFFSET ?3",
            column = sort.column()
        );

        let items: Vec<Book> = sqlx::query_as(&sql)
            .bind(filter)
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM book WHERE name LIKE ?1")
            .bind(filter)
            .fetch_one(&self.db)
            .await?;

        Ok(Page::new(items, page, page_size, total.max(0) as u64))
    }

    /// Every row, ordered by name.
    pub async fn find_all(&self) -> Result<Vec<Book>, sqlx::Error> {
        sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY name"))
            .fetch_all(&self.db)
            .await
    }

    /// Insert a new record and report the generated id, if the engine
    /// produced one.
    pub async fn insert(&self, input: &BookInput) -> Result<Option<i64>, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO book (name, author, publish_date, description) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&input.name)
        .bind(&input.author)
        .bind(input.publish_date)
        .bind(&input.description)
        .execute(&self.db)
        .await?;

        match result.last_insert_rowid() {
            0 => Ok(None),
            id => Ok(Some(id)),
        }
    }

    /// Update all mutable fields by id; returns the affected-row count.
    pub async fn update(&self, id: i64, input: &BookInput) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE book SET name = ?1, author = ?2, publish_date = ?3, description = ?4 \
             WHERE id = ?5",
        )
        .bind(&input.name)
        .bind(&input.author)
        .bind(input.publish_date)
        .bind(&input.description)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete by id; returns the affected-row count.
    pub async fn delete(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
