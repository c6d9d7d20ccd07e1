//! Text normalization and lexical vectorization.

pub mod preprocess;
pub mod stopwords;
pub mod tfidf;

pub use preprocess::preprocess_text;
pub use tfidf::{TfidfModel, TfidfVectorizer};
