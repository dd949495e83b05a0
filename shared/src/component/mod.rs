pub mod dirty;
pub mod kinds;
pub mod policy;
pub mod registry;
pub mod replicate;
pub mod transform;
