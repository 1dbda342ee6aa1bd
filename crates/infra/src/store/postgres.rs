//! Postgres-backed catalog store.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | `PersistenceError` |
//! |------------|-----------------|--------------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` (constraint name carried over) |
//! | Database (other) | any other | `Backend` |
//! | PoolClosed / Io / other | n/a | `Backend` |
//!
//! A commit runs in a single transaction, so a unique violation on any write
//! leaves the catalog untouched.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgDatabaseError, PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use library_application::ports::{AUTHOR_EMAIL_UNIQUE, BOOK_ISBN_UNIQUE};
use library_application::{AddedEntity, PersistenceError};
use library_catalog::{Author, Book};
use library_core::pagination::window;
use library_core::{AuditStamps, Entity, EntityId, PaginatedResult};

use super::{BookRow, CatalogStore, ChangeSet, Write, rehydrate};

const AUTHORS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS authors (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(255) NOT NULL,
        email       VARCHAR(255) NOT NULL,
        created_on  TIMESTAMPTZ NULL,
        created_by  TEXT NULL,
        modified_on TIMESTAMPTZ NULL,
        modified_by TEXT NULL,
        CONSTRAINT authors_email_key UNIQUE (email)
    )
"#;

const BOOKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id             BIGSERIAL PRIMARY KEY,
        author_id      BIGINT NOT NULL REFERENCES authors (id),
        title          VARCHAR(255) NOT NULL,
        isbn           VARCHAR(17) NOT NULL,
        isbn_canonical VARCHAR(13) NOT NULL,
        published_date DATE NOT NULL,
        created_on     TIMESTAMPTZ NULL,
        created_by     TEXT NULL,
        modified_on    TIMESTAMPTZ NULL,
        modified_by    TEXT NULL,
        CONSTRAINT books_author_id_isbn_key UNIQUE (author_id, isbn_canonical)
    )
"#;

const BOOK_COLUMNS: &str = "id, author_id, title, isbn, published_date, \
                            created_on, created_by, modified_on, modified_by";
const AUTHOR_COLUMNS: &str = "id, name, email, created_on, created_by, modified_on, modified_by";

/// Postgres catalog store.
///
/// `Send + Sync`; all access goes through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the catalog tables when they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        for ddl in [AUTHORS_TABLE, BOOKS_TABLE] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn books_of(&self, author_ids: &[i64]) -> Result<HashMap<i64, Vec<Book>>, PersistenceError> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE author_id = ANY($1) ORDER BY id"
        ))
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("books_of", e))?;

        let mut by_author: HashMap<i64, Vec<Book>> = HashMap::new();
        for row in &rows {
            let book = book_from_row(row)?;
            by_author.entry(book.author_id()).or_default().push(book);
        }
        Ok(by_author)
    }

    async fn count(&self, table: &str) -> Result<u64, PersistenceError> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        Ok(total.max(0) as u64)
    }
}

fn audit_from(row: &PgRow) -> Result<AuditStamps, sqlx::Error> {
    Ok(AuditStamps::restore(
        row.try_get::<Option<DateTime<Utc>>, _>("created_on")?,
        row.try_get::<Option<String>, _>("created_by")?,
        row.try_get::<Option<DateTime<Utc>>, _>("modified_on")?,
        row.try_get::<Option<String>, _>("modified_by")?,
    ))
}

fn book_from_row(row: &PgRow) -> Result<Book, PersistenceError> {
    let read = || -> Result<_, sqlx::Error> {
        Ok((
            row.try_get::<i64, _>("id")?,
            audit_from(row)?,
            row.try_get::<i64, _>("author_id")?,
            row.try_get::<String, _>("title")?,
            row.try_get::<String, _>("isbn")?,
            row.try_get::<NaiveDate, _>("published_date")?,
        ))
    };
    let (id, audit, author_id, title, isbn, published_date) =
        read().map_err(|e| map_sqlx_error("decode book", e))?;
    rehydrate::book(id, audit, author_id, title, &isbn, published_date)
}

fn author_from_row(row: &PgRow, books: Vec<Book>) -> Result<Author, PersistenceError> {
    let read = || -> Result<_, sqlx::Error> {
        Ok((
            row.try_get::<i64, _>("id")?,
            audit_from(row)?,
            row.try_get::<String, _>("name")?,
            row.try_get::<String, _>("email")?,
        ))
    };
    let (id, audit, name, email) = read().map_err(|e| map_sqlx_error("decode author", e))?;
    rehydrate::author(id, audit, name, &email, books)
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> PersistenceError {
    if let Some(db) = e.as_database_error() {
        if db.code().as_deref() == Some("23505") {
            let constraint = match db.constraint() {
                Some(AUTHOR_EMAIL_UNIQUE) => AUTHOR_EMAIL_UNIQUE,
                Some(BOOK_ISBN_UNIQUE) => BOOK_ISBN_UNIQUE,
                _ => "unknown",
            };
            let detail = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(PgDatabaseError::detail)
                .unwrap_or_else(|| db.message())
                .to_string();
            return PersistenceError::UniqueViolation { constraint, detail };
        }
    }
    PersistenceError::backend(format!("{operation}: {e}"))
}

async fn insert_books(
    tx: &mut Transaction<'_, Postgres>,
    author_id: i64,
    rows: Vec<BookRow>,
    added: &mut Vec<AddedEntity>,
) -> Result<(), PersistenceError> {
    for row in rows {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO books
                (author_id, title, isbn, isbn_canonical, published_date,
                 created_on, created_by, modified_on, modified_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(&row.title)
        .bind(&row.isbn)
        .bind(&row.isbn_canonical)
        .bind(row.published_date)
        .bind(row.audit.created_on())
        .bind(row.audit.created_by())
        .bind(row.audit.modified_on())
        .bind(row.audit.modified_by())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert book", e))?;
        added.push(AddedEntity {
            entity_type: Book::ENTITY_TYPE,
            id: rehydrate::entity_id(id)?,
        });
    }
    Ok(())
}

async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    write: Write,
    added: &mut Vec<AddedEntity>,
) -> Result<(), PersistenceError> {
    match write {
        Write::InsertAuthor {
            name,
            email,
            audit,
            books,
        } => {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO authors (name, email, created_on, created_by, modified_on, modified_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(&name)
            .bind(&email)
            .bind(audit.created_on())
            .bind(audit.created_by())
            .bind(audit.modified_on())
            .bind(audit.modified_by())
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert author", e))?;
            added.push(AddedEntity {
                entity_type: Author::ENTITY_TYPE,
                id: rehydrate::entity_id(id)?,
            });
            insert_books(tx, id, books, added).await
        }
        Write::UpdateAuthor {
            id,
            name,
            email,
            audit,
            new_books,
        } => {
            let result = sqlx::query(
                r#"
                UPDATE authors
                SET name = $2, email = $3, modified_on = $4, modified_by = $5
                WHERE id = $1
                "#,
            )
            .bind(id.get())
            .bind(&name)
            .bind(&email)
            .bind(audit.modified_on())
            .bind(audit.modified_by())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("update author", e))?;
            if result.rows_affected() == 0 {
                return Err(PersistenceError::backend(format!("author {id} does not exist")));
            }
            insert_books(tx, id.get(), new_books, added).await
        }
        Write::UpdateBook { id, author_id, row } => {
            let result = sqlx::query(
                r#"
                UPDATE books
                SET author_id = $2, title = $3, isbn = $4, isbn_canonical = $5,
                    published_date = $6, modified_on = $7, modified_by = $8
                WHERE id = $1
                "#,
            )
            .bind(id.get())
            .bind(author_id)
            .bind(&row.title)
            .bind(&row.isbn)
            .bind(&row.isbn_canonical)
            .bind(row.published_date)
            .bind(row.audit.modified_on())
            .bind(row.audit.modified_by())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("update book", e))?;
            if result.rows_affected() == 0 {
                return Err(PersistenceError::backend(format!("book {id} does not exist")));
            }
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), fields(author_id = %id), err)]
    async fn author(&self, id: EntityId) -> Result<Option<Author>, PersistenceError> {
        let row = sqlx::query(&format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("author", e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let books = self.books_of(&[id.get()]).await?.remove(&id.get()).unwrap_or_default();
        author_from_row(&row, books).map(Some)
    }

    #[instrument(skip(self), err)]
    async fn authors_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Author>, PersistenceError> {
        let total = self.count("authors").await?;
        let Some((skip, take)) = window(page_number, page_size) else {
            return Ok(PaginatedResult::new(Vec::new(), total, page_number, page_size));
        };

        let rows = sqlx::query(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(take as i64)
        .bind(skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("authors_page", e))?;

        let ids = rows
            .iter()
            .map(|r| r.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode author", e))?;
        let mut books = self.books_of(&ids).await?;

        let mut authors = Vec::with_capacity(rows.len());
        for (row, id) in rows.iter().zip(ids) {
            authors.push(author_from_row(row, books.remove(&id).unwrap_or_default())?);
        }
        Ok(PaginatedResult::new(authors, total, page_number, page_size))
    }

    #[instrument(skip(self), fields(book_id = %id), err)]
    async fn book(&self, id: EntityId) -> Result<Option<Book>, PersistenceError> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("book", e))?;
        row.as_ref().map(book_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn books_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Book>, PersistenceError> {
        let total = self.count("books").await?;
        let Some((skip, take)) = window(page_number, page_size) else {
            return Ok(PaginatedResult::new(Vec::new(), total, page_number, page_size));
        };

        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             ORDER BY published_date DESC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(take as i64)
        .bind(skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("books_page", e))?;

        let books = rows.iter().map(book_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(PaginatedResult::new(books, total, page_number, page_size))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, PersistenceError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM authors WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("email_exists", e))
    }

    async fn author_names(
        &self,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, String>, PersistenceError> {
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let rows = sqlx::query("SELECT id, name FROM authors WHERE id = ANY($1)")
            .bind(&raw)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("author_names", e))?;

        let mut names = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("decode name", e))?;
            let name: String = row.try_get("name").map_err(|e| map_sqlx_error("decode name", e))?;
            names.insert(rehydrate::entity_id(id)?, name);
        }
        Ok(names)
    }

    #[instrument(skip(self, changes), fields(writes = changes.len()), err)]
    async fn commit(&self, changes: ChangeSet) -> Result<Vec<AddedEntity>, PersistenceError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        let mut added = Vec::new();
        for write in changes.writes {
            apply(&mut tx, write, &mut added).await?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(added)
    }
}
