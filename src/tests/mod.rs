// Test modules

mod analyze_handler_test;
pub mod common;
