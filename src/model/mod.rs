pub mod comment;
pub mod item;
