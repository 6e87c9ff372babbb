//! Schema DDL and the fixed demonstration dataset.
//!
//! Two books, three authors, four join rows. Book 1 is written by authors 1
//! and 2; book 2 by authors 1 and 3. The IDs are stable so the query
//! commands can default to them.

use sqlx::PgPool;
use tracing::info;
use uuid::{uuid, Uuid};

use crate::error::Result;
use crate::model::{Author, Book, BookAuthor};

pub const BOOK_1_ID: Uuid = uuid!("1fb112d1-54c9-4308-99c6-0163bfd0172d");
pub const BOOK_2_ID: Uuid = uuid!("554bc347-f36c-4766-b66f-d651c84c56ba");
pub const AUTHOR_1_ID: Uuid = uuid!("bed827ff-6847-41bd-88a0-b77fdd74bea3");
pub const AUTHOR_2_ID: Uuid = uuid!("467021fd-ae39-4ba0-bc7b-3e5b21ef69f9");
pub const AUTHOR_3_ID: Uuid = uuid!("f66c5c85-5044-4433-b631-c01c64a7a4f6");

const SCHEMA: &str = r#"
CREATE SCHEMA IF NOT EXISTS m2m;

CREATE TABLE IF NOT EXISTS m2m.book (
    book_id UUID PRIMARY KEY,
    title TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS m2m.author (
    author_id UUID PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS m2m.book_author (
    book_id UUID NOT NULL REFERENCES m2m.book (book_id),
    author_id UUID NOT NULL REFERENCES m2m.author (author_id),
    position INTEGER NOT NULL,
    PRIMARY KEY (book_id, author_id)
);
"#;

/// The seeded books
pub fn seed_books() -> Vec<Book> {
    vec![
        Book {
            book_id: BOOK_1_ID,
            title: "book 1".to_string(),
        },
        Book {
            book_id: BOOK_2_ID,
            title: "book 2".to_string(),
        },
    ]
}

/// The seeded authors
pub fn seed_authors() -> Vec<Author> {
    vec![
        Author {
            author_id: AUTHOR_1_ID,
            name: "author 1".to_string(),
        },
        Author {
            author_id: AUTHOR_2_ID,
            name: "author 2".to_string(),
        },
        Author {
            author_id: AUTHOR_3_ID,
            name: "author 3".to_string(),
        },
    ]
}

/// The seeded join rows, positions per book
pub fn seed_book_authors() -> Vec<BookAuthor> {
    vec![
        BookAuthor {
            book_id: BOOK_1_ID,
            author_id: AUTHOR_1_ID,
            position: 1,
        },
        BookAuthor {
            book_id: BOOK_1_ID,
            author_id: AUTHOR_2_ID,
            position: 2,
        },
        BookAuthor {
            book_id: BOOK_2_ID,
            author_id: AUTHOR_1_ID,
            position: 1,
        },
        BookAuthor {
            book_id: BOOK_2_ID,
            author_id: AUTHOR_3_ID,
            position: 2,
        },
    ]
}

/// Create the schema if it doesn't exist, wipe the tables, and insert the
/// seed rows. Runs in one transaction so a failed reseed leaves prior data
/// intact.
pub async fn init_db(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::raw_sql(SCHEMA).execute(&mut *tx).await?;

    // Join table first, it references the other two
    sqlx::query("DELETE FROM m2m.book_author")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM m2m.book").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM m2m.author")
        .execute(&mut *tx)
        .await?;

    for book in seed_books() {
        sqlx::query("INSERT INTO m2m.book (book_id, title) VALUES ($1, $2)")
            .bind(book.book_id)
            .bind(&book.title)
            .execute(&mut *tx)
            .await?;
    }

    for author in seed_authors() {
        sqlx::query("INSERT INTO m2m.author (author_id, name) VALUES ($1, $2)")
            .bind(author.author_id)
            .bind(&author.name)
            .execute(&mut *tx)
            .await?;
    }

    for pair in seed_book_authors() {
        sqlx::query(
            "INSERT INTO m2m.book_author (book_id, author_id, position) VALUES ($1, $2, $3)",
        )
        .bind(pair.book_id)
        .bind(pair.author_id)
        .bind(pair.position)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(
        "seeded {} books, {} authors, {} join rows",
        seed_books().len(),
        seed_authors().len(),
        seed_book_authors().len()
    );

    Ok(())
}
