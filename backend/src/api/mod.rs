pub mod favorites;
pub mod notes;
pub mod query_check;
pub mod sessions;
pub mod topics;
pub mod trends;
pub mod videos;
