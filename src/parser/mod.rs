pub mod fields;
pub mod filter;

use crate::export::Record;
use crate::paginator::PostMap;
use filter::CategoryFilter;

/// Filter collected posts to the debit card workflows and extract their fields.
pub fn process_posts(posts: &PostMap) -> Vec<Record> {
    CategoryFilter::default().filter(posts)
}
