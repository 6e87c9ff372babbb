pub mod db;
pub mod error;
pub mod model;
pub mod queries;
pub mod seed;
pub mod settings;

pub use db::{connect, ping};
pub use error::{Result, ShelfError};
pub use model::{Author, Book, BookAuthor, BookWithAuthors};
pub use queries::{fetch_book, filter_books, load_joined, load_lazy, load_selectin};
pub use seed::init_db;
pub use settings::{load_dotenv, ConnectionParts, Settings};
