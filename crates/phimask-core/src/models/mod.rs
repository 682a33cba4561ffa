pub mod chunk;
pub mod entity;
pub mod masking;
pub mod token;
