pub mod trends;
pub mod youtube;
