//! Query patterns and the three many-to-many loading strategies.
//!
//! `load_lazy` issues one authors query per book (the N+1 pattern, shown on
//! purpose). `load_joined` pulls everything in a single LEFT OUTER JOIN and
//! groups in memory. `load_selectin` batches the follow-up into a single
//! `book_id = ANY(...)` query. All three return the same hydrated rows:
//! books ordered by title, authors ordered by join-table position.

use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::{Result, ShelfError};
use crate::model::{Author, Book, BookWithAuthors};

const SELECT_BOOKS: &str = "SELECT book_id, title FROM m2m.book ORDER BY title, book_id";

/// Fetch exactly one book by primary key. Zero rows is an error.
pub async fn fetch_book(pool: &PgPool, book_id: Uuid) -> Result<Book> {
    let book = sqlx::query_as::<_, Book>("SELECT book_id, title FROM m2m.book WHERE book_id = $1")
        .bind(book_id)
        .fetch_optional(pool)
        .await?;

    book.ok_or_else(|| ShelfError::book_not_found(book_id))
}

/// Fetch the books whose IDs appear in `ids` (`IN`-clause filtering).
/// Duplicate input IDs yield each matching book once.
pub async fn filter_books(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Book>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder =
        QueryBuilder::new("SELECT book_id, title FROM m2m.book WHERE book_id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    builder.push(") ORDER BY title, book_id");

    let books = builder.build_query_as::<Book>().fetch_all(pool).await?;
    Ok(books)
}

/// Lazy per-row loading: one query for the books, then one authors query per
/// book. N books means N+1 round trips.
pub async fn load_lazy(pool: &PgPool) -> Result<Vec<BookWithAuthors>> {
    let books = sqlx::query_as::<_, Book>(SELECT_BOOKS).fetch_all(pool).await?;

    let mut result = Vec::with_capacity(books.len());
    for book in books {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT a.author_id, a.name \
             FROM m2m.author a \
             JOIN m2m.book_author ba ON ba.author_id = a.author_id \
             WHERE ba.book_id = $1 \
             ORDER BY ba.position",
        )
        .bind(book.book_id)
        .fetch_all(pool)
        .await?;

        result.push(BookWithAuthors { book, authors });
    }

    Ok(result)
}

/// One row of the joined eager-loading query. Author columns are nullable
/// because of the outer join: a book without authors still produces a row.
#[derive(Debug, Clone, FromRow)]
struct JoinedRow {
    book_id: Uuid,
    title: String,
    author_id: Option<Uuid>,
    name: Option<String>,
    position: Option<i32>,
}

/// Join-based eager loading: a single LEFT OUTER JOIN query, grouped in
/// memory.
pub async fn load_joined(pool: &PgPool) -> Result<Vec<BookWithAuthors>> {
    let rows = sqlx::query_as::<_, JoinedRow>(
        "SELECT b.book_id, b.title, a.author_id, a.name, ba.position \
         FROM m2m.book b \
         LEFT OUTER JOIN m2m.book_author ba ON ba.book_id = b.book_id \
         LEFT OUTER JOIN m2m.author a ON a.author_id = ba.author_id \
         ORDER BY b.title, b.book_id, ba.position",
    )
    .fetch_all(pool)
    .await?;

    Ok(group_joined(rows))
}

/// One row of the batched select-in follow-up query.
#[derive(Debug, Clone, FromRow)]
struct SelectInRow {
    book_id: Uuid,
    author_id: Uuid,
    name: String,
    position: i32,
}

/// Batched "select-in" eager loading: one query for the books, then one
/// `book_id = ANY(...)` query over the collected IDs. Two round trips no
/// matter how many books.
pub async fn load_selectin(pool: &PgPool) -> Result<Vec<BookWithAuthors>> {
    let books = sqlx::query_as::<_, Book>(SELECT_BOOKS).fetch_all(pool).await?;
    if books.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = books.iter().map(|b| b.book_id).collect();
    let rows = sqlx::query_as::<_, SelectInRow>(
        "SELECT ba.book_id, a.author_id, a.name, ba.position \
         FROM m2m.book_author ba \
         JOIN m2m.author a ON a.author_id = ba.author_id \
         WHERE ba.book_id = ANY($1) \
         ORDER BY ba.position",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    Ok(assign_authors(books, rows))
}

/// Group joined rows into hydrated books, preserving book order and sorting
/// authors by position. Consecutive rows for the same book are expected
/// (the query orders by book), but author order within a book may be
/// anything.
fn group_joined(rows: Vec<JoinedRow>) -> Vec<BookWithAuthors> {
    let mut grouped: Vec<(Book, Vec<(i32, Author)>)> = Vec::new();

    for row in rows {
        let needs_new_book = grouped
            .last()
            .map(|(book, _)| book.book_id != row.book_id)
            .unwrap_or(true);
        if needs_new_book {
            grouped.push((
                Book {
                    book_id: row.book_id,
                    title: row.title.clone(),
                },
                Vec::new(),
            ));
        }

        if let (Some(author_id), Some(name), Some(position)) =
            (row.author_id, row.name, row.position)
        {
            if let Some((_, authors)) = grouped.last_mut() {
                authors.push((position, Author { author_id, name }));
            }
        }
    }

    grouped
        .into_iter()
        .map(|(book, mut authors)| {
            authors.sort_by_key(|(position, _)| *position);
            BookWithAuthors {
                book,
                authors: authors.into_iter().map(|(_, author)| author).collect(),
            }
        })
        .collect()
}

/// Attach batched author rows to their books, sorting by position within
/// each book.
fn assign_authors(books: Vec<Book>, mut rows: Vec<SelectInRow>) -> Vec<BookWithAuthors> {
    rows.sort_by_key(|r| r.position);

    books
        .into_iter()
        .map(|book| {
            let authors = rows
                .iter()
                .filter(|r| r.book_id == book.book_id)
                .map(|r| Author {
                    author_id: r.author_id,
                    name: r.name.clone(),
                })
                .collect();
            BookWithAuthors { book, authors }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    const BOOK_1: Uuid = uuid!("1fb112d1-54c9-4308-99c6-0163bfd0172d");
    const BOOK_2: Uuid = uuid!("554bc347-f36c-4766-b66f-d651c84c56ba");
    const AUTHOR_1: Uuid = uuid!("bed827ff-6847-41bd-88a0-b77fdd74bea3");
    const AUTHOR_2: Uuid = uuid!("467021fd-ae39-4ba0-bc7b-3e5b21ef69f9");
    const AUTHOR_3: Uuid = uuid!("f66c5c85-5044-4433-b631-c01c64a7a4f6");

    fn book(id: Uuid, title: &str) -> Book {
        Book {
            book_id: id,
            title: title.to_string(),
        }
    }

    fn joined(book_id: Uuid, title: &str, author: Option<(Uuid, &str, i32)>) -> JoinedRow {
        JoinedRow {
            book_id,
            title: title.to_string(),
            author_id: author.map(|(id, _, _)| id),
            name: author.map(|(_, name, _)| name.to_string()),
            position: author.map(|(_, _, pos)| pos),
        }
    }

    fn selectin(book_id: Uuid, author_id: Uuid, name: &str, position: i32) -> SelectInRow {
        SelectInRow {
            book_id,
            author_id,
            name: name.to_string(),
            position,
        }
    }

    #[test]
    fn test_group_joined_hydrates_books() {
        let rows = vec![
            joined(BOOK_1, "book 1", Some((AUTHOR_1, "author 1", 1))),
            joined(BOOK_1, "book 1", Some((AUTHOR_2, "author 2", 2))),
            joined(BOOK_2, "book 2", Some((AUTHOR_1, "author 1", 1))),
            joined(BOOK_2, "book 2", Some((AUTHOR_3, "author 3", 2))),
        ];

        let result = group_joined(rows);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].book.title, "book 1");
        assert_eq!(result[0].authors.len(), 2);
        assert_eq!(result[0].authors[0].name, "author 1");
        assert_eq!(result[0].authors[1].name, "author 2");
        assert_eq!(result[1].authors[1].name, "author 3");
    }

    #[test]
    fn test_group_joined_keeps_authorless_book() {
        // Outer join: a book without authors yields one row of nulls
        let rows = vec![
            joined(BOOK_1, "book 1", Some((AUTHOR_1, "author 1", 1))),
            joined(BOOK_2, "book 2", None),
        ];

        let result = group_joined(rows);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].authors.len(), 1);
        assert!(result[1].authors.is_empty());
    }

    #[test]
    fn test_group_joined_sorts_authors_by_position() {
        let rows = vec![
            joined(BOOK_1, "book 1", Some((AUTHOR_2, "author 2", 2))),
            joined(BOOK_1, "book 1", Some((AUTHOR_1, "author 1", 1))),
        ];

        let result = group_joined(rows);
        assert_eq!(result[0].authors[0].author_id, AUTHOR_1);
        assert_eq!(result[0].authors[1].author_id, AUTHOR_2);
    }

    #[test]
    fn test_group_joined_empty() {
        assert!(group_joined(Vec::new()).is_empty());
    }

    #[test]
    fn test_assign_authors_matches_by_book() {
        let books = vec![book(BOOK_1, "book 1"), book(BOOK_2, "book 2")];
        let rows = vec![
            selectin(BOOK_2, AUTHOR_3, "author 3", 2),
            selectin(BOOK_1, AUTHOR_1, "author 1", 1),
            selectin(BOOK_2, AUTHOR_1, "author 1", 1),
            selectin(BOOK_1, AUTHOR_2, "author 2", 2),
        ];

        let result = assign_authors(books, rows);
        assert_eq!(result[0].authors[0].author_id, AUTHOR_1);
        assert_eq!(result[0].authors[1].author_id, AUTHOR_2);
        assert_eq!(result[1].authors[0].author_id, AUTHOR_1);
        assert_eq!(result[1].authors[1].author_id, AUTHOR_3);
    }

    #[test]
    fn test_assign_authors_no_rows() {
        let books = vec![book(BOOK_1, "book 1")];
        let result = assign_authors(books, Vec::new());
        assert_eq!(result.len(), 1);
        assert!(result[0].authors.is_empty());
    }

    #[test]
    fn test_joined_and_selectin_agree() {
        // The two eager strategies must hydrate identical results from the
        // same underlying data
        let joined_rows = vec![
            joined(BOOK_1, "book 1", Some((AUTHOR_1, "author 1", 1))),
            joined(BOOK_1, "book 1", Some((AUTHOR_2, "author 2", 2))),
            joined(BOOK_2, "book 2", Some((AUTHOR_1, "author 1", 1))),
            joined(BOOK_2, "book 2", Some((AUTHOR_3, "author 3", 2))),
        ];
        let books = vec![book(BOOK_1, "book 1"), book(BOOK_2, "book 2")];
        let selectin_rows = vec![
            selectin(BOOK_1, AUTHOR_1, "author 1", 1),
            selectin(BOOK_1, AUTHOR_2, "author 2", 2),
            selectin(BOOK_2, AUTHOR_1, "author 1", 1),
            selectin(BOOK_2, AUTHOR_3, "author 3", 2),
        ];

        assert_eq!(group_joined(joined_rows), assign_authors(books, selectin_rows));
    }
}
