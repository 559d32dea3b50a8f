// Record generation, quality checks, cleaning and aggregation
pub mod data;

// Regression ensemble and the pricing model
pub mod ml;
