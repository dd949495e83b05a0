pub mod entity;
pub mod local_entity_map;
pub mod store;
pub mod template;
