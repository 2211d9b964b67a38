pub mod book;
pub mod illustration;
pub mod user;

pub use book::{Book, BookType, Page};
pub use illustration::{Illustration, IllustrationSource};
pub use user::AuthContext;
