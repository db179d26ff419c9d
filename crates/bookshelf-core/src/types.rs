//! Core data types shared by the API client, the page cache, and the store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-assigned identifier of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub u64);

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BookId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A single catalog record.
///
/// Only `id` is required. Every other field, `title` and `isFavorite`
/// included, is kept exactly as the server sent it (missing stays missing,
/// `null` stays `null`) and written back unchanged.
///
/// ```rust
/// use bookshelf_core::Book;
///
/// let book: Book = serde_json::from_str(
///     r#"{"id": 3, "title": "Dune", "author": "Herbert"}"#,
/// )?;
/// assert_eq!(book.id.0, 3);
/// assert_eq!(book.title(), Some("Dune"));
/// assert!(!book.is_favorite());
/// assert_eq!(book.fields["author"], "Herbert");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier.
    pub id: BookId,
    /// Unvalidated fields besides `id`.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Book {
    /// Create a book carrying only a title.
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("title".into(), Value::String(title.into()));
        Self {
            id: BookId(id),
            fields,
        }
    }

    /// Set the favorite flag using builder pattern.
    #[must_use]
    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.fields.insert("isFavorite".into(), Value::Bool(favorite));
        self
    }

    /// The title, if the record has a string one.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }

    /// Whether `isFavorite` is `true`. Missing or `null` reads as `false`.
    #[must_use]
    pub fn is_favorite(&self) -> bool {
        matches!(self.fields.get("isFavorite"), Some(Value::Bool(true)))
    }

    /// Case-insensitive substring match on the title.
    ///
    /// A record without a title never matches.
    #[must_use]
    pub fn title_matches(&self, query: &str) -> bool {
        self.title()
            .is_some_and(|title| title.to_lowercase().contains(&query.to_lowercase()))
    }
}

/// A record that has not been created on the server yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    /// Display title.
    pub title: String,
    /// Initial favorite flag.
    #[serde(rename = "isFavorite", default)]
    pub is_favorite: bool,
    /// Additional fields forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewBook {
    /// Create a new record with only a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Attach an extra field using builder pattern.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// JSON body of a `PUT /books/:id` request.
///
/// May be partial or a full representation; the server decides what to
/// apply and answers with the resulting record.
///
/// ```rust
/// use bookshelf_core::{Book, BookPatch};
///
/// let book = Book::new(1, "Emma");
/// let patch = BookPatch::from_book(&book).favorite(!book.is_favorite());
/// assert_eq!(patch.get("isFavorite"), Some(&serde_json::json!(true)));
/// assert_eq!(patch.get("title"), Some(&serde_json::json!("Emma")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookPatch(Map<String, Value>);

impl BookPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the full representation of an existing record.
    #[must_use]
    pub fn from_book(book: &Book) -> Self {
        match serde_json::to_value(book) {
            Ok(Value::Object(map)) => Self(map),
            // A Book always serializes to an object
            _ => Self::default(),
        }
    }

    /// Set the title.
    #[must_use]
    pub fn title(self, title: impl Into<String>) -> Self {
        self.field("title", title.into())
    }

    /// Set the favorite flag.
    #[must_use]
    pub fn favorite(self, favorite: bool) -> Self {
        self.field("isFavorite", favorite)
    }

    /// Set an arbitrary field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Look up a field in the patch.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether the patch carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pagination metadata of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Number of pages at the requested page size.
    pub total_pages: u32,
    /// Number of records on the server.
    pub total: u64,
    /// Page the server actually returned.
    pub current_page: u32,
}

/// Body of `GET /books?page=&page_size=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    /// Records of the page, in server order.
    pub data: Vec<Book>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// The query pair mirrored into the host's navigation location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageQuery {
    /// 1-indexed page number.
    pub page: u32,
    /// Records per page.
    pub page_size: u32,
}

impl PageQuery {
    /// Render as `page=<n>&page_size=<m>`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        format!("page={}&page_size={}", self.page, self.page_size)
    }
}
