//! Mapped entities for the `m2m` schema: two sides of a many-to-many
//! relationship plus the join table carrying an ordinal position.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row of `m2m.book`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Book {
    pub book_id: Uuid,
    pub title: String,
}

/// A row of `m2m.author`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Author {
    pub author_id: Uuid,
    pub name: String,
}

/// A row of the `m2m.book_author` join table. `position` is the ordinal of
/// the author within the book's author list (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct BookAuthor {
    pub book_id: Uuid,
    pub author_id: Uuid,
    pub position: i32,
}

/// A book hydrated with its authors, ordered by join-table position. Every
/// loading strategy produces this same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookWithAuthors {
    #[serde(flatten)]
    pub book: Book,
    pub authors: Vec<Author>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    #[test]
    fn test_book_with_authors_serializes_flat() {
        let entry = BookWithAuthors {
            book: Book {
                book_id: uuid!("1fb112d1-54c9-4308-99c6-0163bfd0172d"),
                title: "book 1".to_string(),
            },
            authors: vec![Author {
                author_id: uuid!("bed827ff-6847-41bd-88a0-b77fdd74bea3"),
                name: "author 1".to_string(),
            }],
        };

        let json = serde_json::to_value(&entry).unwrap();
        // book fields flatten to the top level
        assert_eq!(json["title"], "book 1");
        assert_eq!(json["authors"][0]["name"], "author 1");
    }
}
