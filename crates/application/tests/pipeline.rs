use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use library_application::{
    AppError, AuthorRepository, BookRepository, CatalogHandlers, CommitReceipt, CreateAuthor,
    CreateBook, GetAuthors, LibraryService, PersistenceError, Session, SessionFactory, UnitOfWork,
    ValidationStage,
};
use library_catalog::{Author, Book, Email};
use library_core::{AuditStamps, CancellationSignal, EntityId, FixedClock, PaginatedResult};

/// Read-only catalog with one author; commits are counted, never applied.
#[derive(Default)]
struct Fixture {
    opened: AtomicUsize,
    commits: AtomicUsize,
}

struct Repos(Arc<Fixture>);

fn stored_author() -> Author {
    Author::rehydrate(
        EntityId::new(1).unwrap(),
        AuditStamps::default(),
        "Test Author".to_string(),
        Email::create("testauthor@mailinator.com").unwrap(),
        Vec::new(),
    )
}

#[async_trait]
impl AuthorRepository for Repos {
    async fn add(&self, _author: Author) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<Author>, PersistenceError> {
        Ok((id.get() == 1).then(stored_author))
    }

    async fn get_paginated(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Author>, PersistenceError> {
        Ok(PaginatedResult::from_ordered(
            &[stored_author()],
            page_number,
            page_size,
        ))
    }

    async fn update(&self, _author: Author) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, PersistenceError> {
        Ok(email.value() == "testauthor@mailinator.com")
    }

    async fn names_for(
        &self,
        _ids: &[EntityId],
    ) -> Result<HashMap<EntityId, String>, PersistenceError> {
        Ok(HashMap::new())
    }
}

#[async_trait]
impl BookRepository for Repos {
    async fn get_by_id(&self, _id: EntityId) -> Result<Option<Book>, PersistenceError> {
        Ok(None)
    }

    async fn get_paginated(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<Book>, PersistenceError> {
        Ok(PaginatedResult::empty(page_number, page_size))
    }

    async fn update(&self, _book: Book) -> Result<(), PersistenceError> {
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for Repos {
    async fn commit(&self, cancel: &CancellationSignal) -> Result<CommitReceipt, PersistenceError> {
        if cancel.is_cancelled() {
            return Err(PersistenceError::Cancelled);
        }
        self.0.commits.fetch_add(1, Ordering::SeqCst);
        Ok(CommitReceipt::default())
    }
}

struct Sessions(Arc<Fixture>);

impl SessionFactory for Sessions {
    fn open(&self) -> Session {
        self.0.opened.fetch_add(1, Ordering::SeqCst);
        let repos = Arc::new(Repos(self.0.clone()));
        Session {
            authors: repos.clone(),
            books: repos.clone(),
            unit_of_work: repos,
        }
    }
}

fn service() -> (LibraryService<CatalogHandlers>, Arc<Fixture>) {
    let fixture = Arc::new(Fixture::default());
    let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    let service = LibraryService::new(
        ValidationStage::catalog(clock.clone(), 500),
        CatalogHandlers::new(clock),
        Arc::new(Sessions(fixture.clone())),
    );
    (service, fixture)
}

#[tokio::test]
async fn invalid_requests_never_reach_a_handler() {
    let (service, fixture) = service();
    let err = service
        .send(
            CreateAuthor {
                name: String::new(),
                email: String::new(),
            },
            &CancellationSignal::new(),
        )
        .await
        .unwrap_err();

    let AppError::Validation(failure) = err else {
        panic!("expected a validation failure, got {err:?}");
    };
    assert_eq!(failure.errors().len(), 2);
    assert_eq!(fixture.opened.load(Ordering::SeqCst), 0);
    assert_eq!(fixture.commits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_requests_are_rejected_up_front() {
    let (service, fixture) = service();
    let cancel = CancellationSignal::new();
    cancel.cancel();

    let err = service.send(GetAuthors::page(1, 50), &cancel).await.unwrap_err();
    assert!(matches!(err, AppError::Cancelled));
    assert_eq!(fixture.opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn existing_email_is_a_conflict() {
    let (service, fixture) = service();
    let err = service
        .send(
            CreateAuthor {
                name: "Someone".to_string(),
                email: "testauthor@mailinator.com".to_string(),
            },
            &CancellationSignal::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Author with email, testauthor@mailinator.com already exist."
    );
    assert_eq!(fixture.opened.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.commits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_author_is_not_found() {
    let (service, _) = service();
    let err = service
        .send(
            CreateBook {
                author_id: 42,
                title: "Dune".to_string(),
                isbn: "978-0-306-40615-7".to_string(),
                published_date: NaiveDate::from_ymd_opt(1965, 8, 1),
            },
            &CancellationSignal::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Author with ID 42 could not be found.");
}

#[tokio::test]
async fn listings_are_mapped_to_responses() {
    let (service, _) = service();
    let page = service
        .send(GetAuthors::page(1, 50), &CancellationSignal::new())
        .await
        .unwrap();
    assert_eq!(page.total_count(), 1);
    assert_eq!(page.page_size(), 50);
    assert_eq!(page.items()[0].name, "Test Author");
    assert_eq!(page.items()[0].book_count, 0);
}
