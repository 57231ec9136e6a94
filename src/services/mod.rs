pub mod mirror;
pub mod object_store;
pub mod recognizer;
pub mod uploads;
