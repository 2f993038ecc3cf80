pub mod child;
pub mod errors;
pub mod host;
pub mod parse;
pub mod sweep;
pub mod table;
