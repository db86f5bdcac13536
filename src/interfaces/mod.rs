pub mod query;
pub mod wire;
pub mod xml;
