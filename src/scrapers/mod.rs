//! Web page scraping.
//!
//! The verifier compares a claim against the text of the page it cites.
//! [`page`] holds the download and text extraction for arbitrary news pages;
//! unlike the NewsAPI fetcher it never fails loudly, it returns `None`.

pub mod page;

pub use page::PageScraper;
