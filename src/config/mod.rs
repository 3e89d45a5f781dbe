pub mod error;
pub mod mongo_config;
