// Domain layer - Core types, errors and result classification

pub mod errors;
pub mod model;
pub mod rules;
