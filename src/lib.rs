pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod intent;
pub mod kernel;
pub mod outputs;
pub mod services;

// Re-export specific items if needed for convenient access
pub use driver::Driver;
pub use kernel::coordinator::Coordinator;
