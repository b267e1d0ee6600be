pub mod entities;
pub mod errors;
pub mod fields;
pub mod ports;
