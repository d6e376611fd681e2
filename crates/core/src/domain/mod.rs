pub mod link;
pub mod message;
pub mod scrape;
