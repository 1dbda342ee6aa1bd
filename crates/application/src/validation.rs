//! Request validation stage.
//!
//! Validators are registered per request type once, at startup, through
//! [`ValidationStageBuilder`]. Before a request reaches its handler every
//! validator registered for its concrete type runs, and all of their failures
//! are gathered into a single [`ValidationFailure`]. Input shape is checked
//! here; value object factories still enforce format (e.g. the email pattern)
//! once the handler runs.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use library_catalog::MAX_TEXT_LEN;
use library_core::Clock;

use crate::requests::{
    AuthorCommand, BookCommand, ByIdQuery, CreateAuthor, CreateBook, GetAuthor, GetAuthors,
    GetBook, GetBooks, PagedQuery, UpdateBook,
};

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub field: &'static str,
    pub message: String,
}

impl FieldFailure {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All failures for a request, keyed by field name.
///
/// Messages for a field keep the order the validators produced them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("One or more validation failures have occurred: {}", summary(.errors))]
pub struct ValidationFailure {
    errors: BTreeMap<String, Vec<String>>,
}

fn summary(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationFailure {
    pub fn from_failures(failures: impl IntoIterator<Item = FieldFailure>) -> Self {
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for f in failures {
            errors.entry(f.field.to_string()).or_default().push(f.message);
        }
        Self { errors }
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn messages_for(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks one aspect of a request.
pub trait Validator<R>: Send + Sync {
    fn validate(&self, request: &R) -> Vec<FieldFailure>;
}

/// Field rules. Messages follow the wording API clients already rely on.
pub mod rules {
    use super::FieldFailure;

    pub fn not_empty(field: &'static str, value: &str) -> Option<FieldFailure> {
        value
            .trim()
            .is_empty()
            .then(|| FieldFailure::new(field, format!("'{field}' must not be empty.")))
    }

    pub fn max_length(field: &'static str, value: &str, max: usize) -> Option<FieldFailure> {
        let entered = value.chars().count();
        (entered > max).then(|| {
            FieldFailure::new(
                field,
                format!(
                    "The length of '{field}' must be {max} characters or fewer. You entered {entered} characters."
                ),
            )
        })
    }

    pub fn length_between(
        field: &'static str,
        value: &str,
        min: usize,
        max: usize,
    ) -> Option<FieldFailure> {
        let entered = value.chars().count();
        (entered < min || entered > max).then(|| {
            FieldFailure::new(
                field,
                format!(
                    "'{field}' must be between {min} and {max} characters. You entered {entered} characters."
                ),
            )
        })
    }

    /// `0` counts as "not provided" for integer references.
    pub fn id_not_empty(field: &'static str, value: i64) -> Option<FieldFailure> {
        (value == 0).then(|| FieldFailure::new(field, format!("'{field}' must not be empty.")))
    }

    pub fn not_equal(field: &'static str, value: i64, forbidden: i64) -> Option<FieldFailure> {
        (value == forbidden).then(|| {
            FieldFailure::new(field, format!("'{field}' must not be equal to '{forbidden}'."))
        })
    }

    pub fn greater_than(field: &'static str, value: i64, bound: i64) -> Option<FieldFailure> {
        (value <= bound)
            .then(|| FieldFailure::new(field, format!("'{field}' must be greater than '{bound}'.")))
    }

    pub fn inclusive_between(
        field: &'static str,
        value: u32,
        from: u32,
        to: u32,
    ) -> Option<FieldFailure> {
        (value < from || value > to).then(|| {
            FieldFailure::new(
                field,
                format!("'{field}' must be between {from} and {to}. You entered {value}."),
            )
        })
    }
}

/// Name and email presence and length.
#[derive(Debug, Default)]
pub struct AuthorCommandValidator;

impl<R: AuthorCommand> Validator<R> for AuthorCommandValidator {
    fn validate(&self, request: &R) -> Vec<FieldFailure> {
        [
            rules::not_empty("Name", request.name()),
            rules::max_length("Name", request.name(), MAX_TEXT_LEN),
            rules::not_empty("Email", request.email()),
            rules::max_length("Email", request.email(), MAX_TEXT_LEN),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Title, author reference, ISBN shape and publication date.
#[derive(Debug)]
pub struct BookCommandValidator {
    clock: Arc<dyn Clock>,
}

impl BookCommandValidator {
    /// Raw ISBN length bounds; hyphens are still in the input at this point.
    pub const ISBN_MIN_LEN: usize = 13;
    pub const ISBN_MAX_LEN: usize = 17;

    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl<R: BookCommand> Validator<R> for BookCommandValidator {
    fn validate(&self, request: &R) -> Vec<FieldFailure> {
        let mut failures: Vec<FieldFailure> = [
            rules::not_empty("Title", request.title()),
            rules::max_length("Title", request.title(), MAX_TEXT_LEN),
            rules::id_not_empty("Author Id", request.author_id()),
            rules::not_equal("Author Id", request.author_id(), 0),
            rules::not_empty("ISBN", request.isbn()),
            rules::length_between(
                "ISBN",
                request.isbn(),
                Self::ISBN_MIN_LEN,
                Self::ISBN_MAX_LEN,
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        match request.published_date() {
            None => failures.push(FieldFailure::new(
                "Published Date",
                "'Published Date' must not be empty.",
            )),
            Some(date) if date > self.clock.today() => failures.push(FieldFailure::new(
                "Published Date",
                "Published date must not be in the future.",
            )),
            Some(_) => {}
        }
        failures
    }
}

/// Page number from 1, page size between 1 and the configured maximum.
#[derive(Debug)]
pub struct PaginationValidator {
    max_page_size: u32,
}

impl PaginationValidator {
    pub fn new(max_page_size: u32) -> Self {
        Self { max_page_size }
    }
}

impl<R: PagedQuery> Validator<R> for PaginationValidator {
    fn validate(&self, request: &R) -> Vec<FieldFailure> {
        let mut failures = Vec::new();
        if request.page_number() < 1 {
            failures.push(FieldFailure::new(
                "Page Number",
                "'Page Number' must be greater than or equal to '1'.",
            ));
        }
        failures.extend(rules::inclusive_between(
            "Page Size",
            request.page_size(),
            1,
            self.max_page_size,
        ));
        failures
    }
}

/// Positive ids for single-entity lookups.
#[derive(Debug, Default)]
pub struct IdValidator;

impl<R: ByIdQuery> Validator<R> for IdValidator {
    fn validate(&self, request: &R) -> Vec<FieldFailure> {
        rules::greater_than("Id", request.id(), 0).into_iter().collect()
    }
}

/// Static registry: request type → ordered validators.
pub struct ValidationStage {
    validators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl core::fmt::Debug for ValidationStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ValidationStage")
            .field("request_types", &self.validators.len())
            .finish()
    }
}

impl ValidationStage {
    pub fn builder() -> ValidationStageBuilder {
        ValidationStageBuilder {
            validators: HashMap::new(),
        }
    }

    /// The stage used by the catalog service: one validator set per request.
    pub fn catalog(clock: Arc<dyn Clock>, max_page_size: u32) -> Self {
        let books = Arc::new(BookCommandValidator::new(clock));
        let pages = Arc::new(PaginationValidator::new(max_page_size));
        Self::builder()
            .register::<CreateAuthor>(Arc::new(AuthorCommandValidator))
            .register::<CreateBook>(books.clone())
            .register::<UpdateBook>(books)
            .register::<UpdateBook>(Arc::new(UpdateTargetValidator))
            .register::<GetAuthor>(Arc::new(IdValidator))
            .register::<GetBook>(Arc::new(IdValidator))
            .register::<GetAuthors>(pages.clone())
            .register::<GetBooks>(pages)
            .build()
    }

    fn registered<R: 'static>(&self) -> &[Arc<dyn Validator<R>>] {
        self.validators
            .get(&TypeId::of::<R>())
            .and_then(|v| v.downcast_ref::<Vec<Arc<dyn Validator<R>>>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn validator_count<R: 'static>(&self) -> usize {
        self.registered::<R>().len()
    }

    /// Run every validator for `R`. Passing means "no validator objected",
    /// including the case where none is registered.
    pub fn validate<R: 'static>(&self, request: &R) -> Result<(), ValidationFailure> {
        let failures: Vec<FieldFailure> = self
            .registered::<R>()
            .iter()
            .flat_map(|v| v.validate(request))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::from_failures(failures))
        }
    }
}

/// Builds a [`ValidationStage`].
pub struct ValidationStageBuilder {
    validators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ValidationStageBuilder {
    /// Append `validator` to the list for `R`.
    pub fn register<R: 'static>(mut self, validator: Arc<dyn Validator<R>>) -> Self {
        let slot = self
            .validators
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(Vec::<Arc<dyn Validator<R>>>::new()));
        if let Some(list) = slot.downcast_mut::<Vec<Arc<dyn Validator<R>>>>() {
            list.push(validator);
        }
        self
    }

    pub fn build(self) -> ValidationStage {
        ValidationStage {
            validators: self.validators,
        }
    }
}

/// The book being updated must be addressed by a positive id.
#[derive(Debug, Default)]
pub struct UpdateTargetValidator;

impl Validator<UpdateBook> for UpdateTargetValidator {
    fn validate(&self, request: &UpdateBook) -> Vec<FieldFailure> {
        rules::greater_than("Id", request.id, 0).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use library_core::FixedClock;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn stage() -> ValidationStage {
        ValidationStage::catalog(Arc::new(FixedClock::on(today())), 500)
    }

    fn create_book() -> CreateBook {
        CreateBook {
            author_id: 1,
            title: "Dune".to_string(),
            isbn: "978-0-306-40615-7".to_string(),
            published_date: Some(NaiveDate::from_ymd_opt(1965, 8, 1).unwrap()),
        }
    }

    #[test]
    fn valid_requests_pass() {
        let stage = stage();
        assert!(
            stage
                .validate(&CreateAuthor {
                    name: "Jane".to_string(),
                    email: "jane@test.com".to_string(),
                })
                .is_ok()
        );
        assert!(stage.validate(&create_book()).is_ok());
        assert!(stage.validate(&GetAuthors::page(1, 50)).is_ok());
        assert!(stage.validate(&GetBook { id: 4 }).is_ok());
    }

    #[test]
    fn author_failures_are_collected_per_field() {
        let failure = stage()
            .validate(&CreateAuthor {
                name: String::new(),
                email: "e".repeat(256),
            })
            .unwrap_err();

        assert_eq!(failure.messages_for("Name"), ["'Name' must not be empty."]);
        assert_eq!(
            failure.messages_for("Email"),
            ["The length of 'Email' must be 255 characters or fewer. You entered 256 characters."]
        );
    }

    #[test]
    fn zero_author_id_reports_both_rules() {
        let request = CreateBook {
            author_id: 0,
            ..create_book()
        };
        let failure = stage().validate(&request).unwrap_err();
        assert_eq!(
            failure.messages_for("Author Id"),
            [
                "'Author Id' must not be empty.",
                "'Author Id' must not be equal to '0'."
            ]
        );
    }

    #[test]
    fn isbn_raw_length_is_bounded() {
        for (isbn, entered) in [("0-306-4061", 10), ("978-0-306-40615-7-11", 20)] {
            let request = CreateBook {
                isbn: isbn.to_string(),
                ..create_book()
            };
            let failure = stage().validate(&request).unwrap_err();
            assert_eq!(
                failure.messages_for("ISBN"),
                [format!(
                    "'ISBN' must be between 13 and 17 characters. You entered {entered} characters."
                )]
            );
        }
    }

    #[test]
    fn published_date_must_be_present_and_not_in_the_future() {
        let missing = CreateBook {
            published_date: None,
            ..create_book()
        };
        assert_eq!(
            stage().validate(&missing).unwrap_err().messages_for("Published Date"),
            ["'Published Date' must not be empty."]
        );

        let future = CreateBook {
            published_date: today().succ_opt(),
            ..create_book()
        };
        assert_eq!(
            stage().validate(&future).unwrap_err().messages_for("Published Date"),
            ["Published date must not be in the future."]
        );

        let same_day = CreateBook {
            published_date: Some(today()),
            ..create_book()
        };
        assert!(stage().validate(&same_day).is_ok());
    }

    #[test]
    fn update_runs_both_registered_validators() {
        let stage = stage();
        assert_eq!(stage.validator_count::<UpdateBook>(), 2);

        let failure = stage
            .validate(&UpdateBook {
                id: 0,
                author_id: 1,
                title: String::new(),
                isbn: "978-0-306-40615-7".to_string(),
                published_date: Some(today()),
            })
            .unwrap_err();
        assert_eq!(failure.messages_for("Id"), ["'Id' must be greater than '0'."]);
        assert_eq!(failure.messages_for("Title"), ["'Title' must not be empty."]);
    }

    #[test]
    fn page_bounds_are_checked() {
        let failure = stage().validate(&GetBooks::page(0, 501)).unwrap_err();
        assert_eq!(
            failure.messages_for("Page Number"),
            ["'Page Number' must be greater than or equal to '1'."]
        );
        assert_eq!(
            failure.messages_for("Page Size"),
            ["'Page Size' must be between 1 and 500. You entered 501."]
        );
    }

    #[test]
    fn unregistered_types_pass() {
        struct Unchecked;
        assert!(stage().validate(&Unchecked).is_ok());
        assert_eq!(stage().validator_count::<Unchecked>(), 0);
    }

    #[test]
    fn display_lists_every_field() {
        let failure = ValidationFailure::from_failures([
            FieldFailure::new("Name", "'Name' must not be empty."),
            FieldFailure::new("Email", "'Email' must not be empty."),
        ]);
        assert_eq!(
            failure.to_string(),
            "One or more validation failures have occurred: Email: 'Email' must not be empty.; Name: 'Name' must not be empty."
        );
    }

    proptest! {
        #[test]
        fn isbn_length_bounds_hold_for_any_raw_length(len in 0usize..32) {
            let request = CreateBook {
                isbn: "7".repeat(len),
                ..create_book()
            };
            let in_range =
                (BookCommandValidator::ISBN_MIN_LEN..=BookCommandValidator::ISBN_MAX_LEN).contains(&len);
            let isbn_failures = match stage().validate(&request) {
                Ok(()) => 0,
                Err(failure) => failure.messages_for("ISBN").len(),
            };
            prop_assert_eq!(isbn_failures == 0, in_range);
        }
    }
}
