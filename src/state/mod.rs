//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Category`: the listing categories (for sale, for rent) crawled independently
//! - `PaginationState`: where the pagination driver of one category stands

mod category;
mod pagination_state;

// Re-export main types
pub use category::Category;
pub use pagination_state::PaginationState;
