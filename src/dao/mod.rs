/// Database model definitions.
pub mod models;
/// Service, session, program and report storage operations.
pub mod schedule_store;
/// Storage abstraction layer for database operations.
pub mod storage;
