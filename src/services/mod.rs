pub mod file_service;
pub mod object_store;
pub mod reconciler;
pub mod status_table;
pub mod worker;
