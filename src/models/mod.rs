pub mod entity;
pub mod version;

pub use entity::Entity;
pub use version::Version;
