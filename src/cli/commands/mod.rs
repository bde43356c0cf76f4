pub mod changes;
pub mod token;
