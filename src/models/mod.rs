//! Data models for Bookshelf

pub mod book;
pub mod lookup;
pub mod profile;
pub mod session;
pub mod user_book;

// Re-export commonly used types
pub use book::{Book, BookSummary, CreateBook, UpdateBook};
pub use lookup::Lookup;
pub use profile::{Profile, UpdateProfile};
pub use session::{AuthEvent, Session, SessionUser};
pub use user_book::{CreateUserBook, UpdateUserBook, UserBook, UserBookWithBook};
