use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use library_application::ports::{AUTHOR_EMAIL_UNIQUE, BOOK_ISBN_UNIQUE};
use library_application::{AddedEntity, PersistenceError};
use library_catalog::{Author, Book};
use library_core::pagination::window;
use library_core::{AuditStamps, Entity, EntityId, PaginatedResult};

use super::{BookRow, CatalogStore, ChangeSet, Write, rehydrate};

#[derive(Debug, Clone)]
struct AuthorRecord {
    name: String,
    email: String,
    audit: AuditStamps,
}

#[derive(Debug, Clone)]
struct BookRecord {
    author_id: i64,
    row: BookRow,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    authors: BTreeMap<i64, AuthorRecord>,
    books: BTreeMap<i64, BookRecord>,
    last_author_id: i64,
    last_book_id: i64,
}

impl Tables {
    fn load_book(&self, id: i64, rec: &BookRecord) -> Result<Book, PersistenceError> {
        rehydrate::book(
            id,
            rec.row.audit.clone(),
            rec.author_id,
            rec.row.title.clone(),
            &rec.row.isbn,
            rec.row.published_date,
        )
    }

    fn load_author(&self, id: i64, rec: &AuthorRecord) -> Result<Author, PersistenceError> {
        let books = self
            .books
            .iter()
            .filter(|(_, b)| b.author_id == id)
            .map(|(book_id, b)| self.load_book(*book_id, b))
            .collect::<Result<Vec<_>, _>>()?;
        rehydrate::author(id, rec.audit.clone(), rec.name.clone(), &rec.email, books)
    }

    fn check_email(&self, email: &str, except: Option<i64>) -> Result<(), PersistenceError> {
        let taken = self
            .authors
            .iter()
            .any(|(id, a)| a.email == email && Some(*id) != except);
        if taken {
            return Err(PersistenceError::UniqueViolation {
                constraint: AUTHOR_EMAIL_UNIQUE,
                detail: format!("Key (email)=({email}) already exists."),
            });
        }
        Ok(())
    }

    fn check_isbn(
        &self,
        author_id: i64,
        row: &BookRow,
        except: Option<i64>,
    ) -> Result<(), PersistenceError> {
        let taken = self.books.iter().any(|(id, b)| {
            b.author_id == author_id
                && b.row.isbn_canonical == row.isbn_canonical
                && Some(*id) != except
        });
        if taken {
            return Err(PersistenceError::UniqueViolation {
                constraint: BOOK_ISBN_UNIQUE,
                detail: format!(
                    "Key (author_id, isbn)=({author_id}, {}) already exists.",
                    row.isbn_canonical
                ),
            });
        }
        Ok(())
    }

    fn check_author_exists(&self, author_id: i64) -> Result<(), PersistenceError> {
        if self.authors.contains_key(&author_id) {
            Ok(())
        } else {
            Err(PersistenceError::backend(format!(
                "books_author_id_fkey: author {author_id} does not exist"
            )))
        }
    }

    fn insert_books(
        &mut self,
        author_id: i64,
        rows: Vec<BookRow>,
        added: &mut Vec<AddedEntity>,
    ) -> Result<(), PersistenceError> {
        for row in rows {
            self.check_isbn(author_id, &row, None)?;
            self.last_book_id += 1;
            let id = self.last_book_id;
            self.books.insert(id, BookRecord { author_id, row });
            added.push(AddedEntity {
                entity_type: Book::ENTITY_TYPE,
                id: rehydrate::entity_id(id)?,
            });
        }
        Ok(())
    }

    fn apply(&mut self, write: Write, added: &mut Vec<AddedEntity>) -> Result<(), PersistenceError> {
        match write {
            Write::InsertAuthor {
                name,
                email,
                audit,
                books,
            } => {
                self.check_email(&email, None)?;
                self.last_author_id += 1;
                let id = self.last_author_id;
                self.authors.insert(id, AuthorRecord { name, email, audit });
                added.push(AddedEntity {
                    entity_type: Author::ENTITY_TYPE,
                    id: rehydrate::entity_id(id)?,
                });
                self.insert_books(id, books, added)
            }
            Write::UpdateAuthor {
                id,
                name,
                email,
                audit,
                new_books,
            } => {
                let id = id.get();
                self.check_author_exists(id)?;
                self.check_email(&email, Some(id))?;
                self.authors.insert(id, AuthorRecord { name, email, audit });
                self.insert_books(id, new_books, added)
            }
            Write::UpdateBook { id, author_id, row } => {
                let id = id.get();
                if !self.books.contains_key(&id) {
                    return Err(PersistenceError::backend(format!("book {id} does not exist")));
                }
                self.check_author_exists(author_id)?;
                self.check_isbn(author_id, &row, Some(id))?;
                self.books.insert(id, BookRecord { author_id, row });
                Ok(())
            }
        }
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. A commit is applied to a copy of the tables that
/// replaces the live tables only when every write succeeded.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&Tables) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| PersistenceError::backend("lock poisoned"))?;
        f(&tables)
    }

    pub fn author_count(&self) -> usize {
        self.tables.read().map(|t| t.authors.len()).unwrap_or(0)
    }

    pub fn book_count(&self) -> usize {
        self.tables.read().map(|t| t.books.len()).unwrap_or(0)
    }
}

/// Window an ordered id list and load only the ids on the page.
fn page_of<T>(
    ids: &[i64],
    page_number: u32,
    page_size: u32,
    load: impl Fn(i64) -> Result<T, PersistenceError>,
) -> Result<PaginatedResult<T>, PersistenceError> {
    let items = match window(page_number, page_size) {
        Some((skip, take)) => ids
            .iter()
            .skip(skip)
            .take(take)
            .map(|id| load(*id))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    Ok(PaginatedResult::new(items, ids.len() as u64, page_number, page_size))
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn author(&self, id: EntityId) -> Result<Option<Author>, PersistenceError> {
        self.read(|t| {
            t.authors
                .get(&id.get())
                .map(|rec| t.load_author(id.get(), rec))
                .transpose()
        })
    }

    async fn authors_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Author>, PersistenceError> {
        self.read(|t| {
            let ids: Vec<i64> = t.authors.keys().copied().collect();
            page_of(&ids, page_number, page_size, |id| match t.authors.get(&id) {
                Some(rec) => t.load_author(id, rec),
                None => Err(PersistenceError::backend(format!("author {id} vanished"))),
            })
        })
    }

    async fn book(&self, id: EntityId) -> Result<Option<Book>, PersistenceError> {
        self.read(|t| {
            t.books
                .get(&id.get())
                .map(|rec| t.load_book(id.get(), rec))
                .transpose()
        })
    }

    async fn books_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Book>, PersistenceError> {
        self.read(|t| {
            let mut ordered: Vec<(i64, &BookRecord)> =
                t.books.iter().map(|(id, rec)| (*id, rec)).collect();
            ordered.sort_by(|(a_id, a), (b_id, b)| {
                b.row
                    .published_date
                    .cmp(&a.row.published_date)
                    .then(a_id.cmp(b_id))
            });
            let ids: Vec<i64> = ordered.into_iter().map(|(id, _)| id).collect();
            page_of(&ids, page_number, page_size, |id| match t.books.get(&id) {
                Some(rec) => t.load_book(id, rec),
                None => Err(PersistenceError::backend(format!("book {id} vanished"))),
            })
        })
    }

    async fn email_exists(&self, email: &str) -> Result<bool, PersistenceError> {
        self.read(|t| Ok(t.authors.values().any(|a| a.email == email)))
    }

    async fn author_names(
        &self,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, String>, PersistenceError> {
        self.read(|t| {
            Ok(ids
                .iter()
                .filter_map(|id| t.authors.get(&id.get()).map(|a| (*id, a.name.clone())))
                .collect())
        })
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Vec<AddedEntity>, PersistenceError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| PersistenceError::backend("lock poisoned"))?;

        let mut staged = tables.clone();
        let mut added = Vec::new();
        for write in changes.writes {
            staged.apply(write, &mut added)?;
        }
        *tables = staged;
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn row(title: &str, isbn: &str, year: i32) -> BookRow {
        BookRow {
            title: title.to_string(),
            isbn: isbn.to_string(),
            isbn_canonical: isbn.replace('-', ""),
            published_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            audit: AuditStamps::default(),
        }
    }

    fn insert_author(email: &str, books: Vec<BookRow>) -> Write {
        Write::InsertAuthor {
            name: "Author".to_string(),
            email: email.to_string(),
            audit: AuditStamps::default(),
            books,
        }
    }

    fn changes(writes: Vec<Write>) -> ChangeSet {
        ChangeSet { writes }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_write_order() {
        let store = InMemoryCatalogStore::new();
        let added = store
            .commit(changes(vec![
                insert_author("a@test.com", vec![row("One", "978-0-306-40615-7", 2001)]),
                insert_author("b@test.com", vec![]),
            ]))
            .await
            .unwrap();

        let kinds: Vec<(&str, i64)> = added.iter().map(|a| (a.entity_type, a.id.get())).collect();
        assert_eq!(
            kinds,
            [("catalog.author", 1), ("catalog.book", 1), ("catalog.author", 2)]
        );
    }

    #[tokio::test]
    async fn duplicate_email_rejects_the_whole_commit() {
        let store = InMemoryCatalogStore::new();
        store
            .commit(changes(vec![insert_author("a@test.com", vec![])]))
            .await
            .unwrap();

        let err = store
            .commit(changes(vec![
                insert_author("b@test.com", vec![]),
                insert_author("a@test.com", vec![]),
            ]))
            .await
            .unwrap_err();

        assert!(err.is_unique_violation(AUTHOR_EMAIL_UNIQUE));
        assert_eq!(store.author_count(), 1);
        assert!(!store.email_exists("b@test.com").await.unwrap());
    }

    #[tokio::test]
    async fn isbn_is_unique_per_author_only() {
        let store = InMemoryCatalogStore::new();
        store
            .commit(changes(vec![
                insert_author("a@test.com", vec![row("One", "978-0-306-40615-7", 2001)]),
                insert_author("b@test.com", vec![row("Same", "9780306406157", 2002)]),
            ]))
            .await
            .unwrap();

        let err = store
            .commit(changes(vec![Write::UpdateAuthor {
                id: EntityId::new(1).unwrap(),
                name: "Author".to_string(),
                email: "a@test.com".to_string(),
                audit: AuditStamps::default(),
                new_books: vec![row("Again", "978-0-306-40615-7", 2003)],
            }]))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(BOOK_ISBN_UNIQUE));
        assert_eq!(store.book_count(), 2);
    }

    #[tokio::test]
    async fn books_are_listed_newest_first() {
        let store = InMemoryCatalogStore::new();
        store
            .commit(changes(vec![insert_author(
                "a@test.com",
                vec![
                    row("Old", "978-0-306-40615-7", 1990),
                    row("New", "0-30640-615-2", 2020),
                    row("Middle", "978-3-16-148410-0", 2005),
                ],
            )]))
            .await
            .unwrap();

        let page = store.books_page(1, 2).await.unwrap();
        let titles: Vec<&str> = page.items().iter().map(Book::title).collect();
        assert_eq!(titles, ["New", "Middle"]);
        assert_eq!(page.total_count(), 3);
        assert!(page.has_next_page());

        let author = store.author(EntityId::new(1).unwrap()).await.unwrap().unwrap();
        assert_eq!(author.book_count(), 3);
    }
}
