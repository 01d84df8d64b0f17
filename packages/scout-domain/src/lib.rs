pub mod candidate;
pub mod picks;
pub mod poster;
pub mod query;
