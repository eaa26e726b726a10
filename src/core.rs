pub mod crawl;
pub mod cursor;
pub mod deck;
pub mod extract;
pub mod stats;
