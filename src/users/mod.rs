pub mod selection;
pub mod user;
