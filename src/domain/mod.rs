// Pricing observations and their schema
pub mod records;

// Model features, scaling and evaluation
pub mod ml;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
