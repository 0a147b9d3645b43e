// file: src/utils/mod.rs
// description: module declarations for shared utilities

pub mod logging;
pub mod validation;

pub use validation::Validator;
