use std::collections::HashMap;

use thiserror::Error;

use crate::world::entity::EntityId;

/// Errors that can occur while binding entity id translations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityMapError {
    #[error("server entity {0:?} is already bound to a local entity")]
    ServerAlreadyBound(EntityId),

    #[error("local entity {0:?} is already bound to a server entity")]
    LocalAlreadyBound(EntityId),
}

/// Two-way translation between the server's authoritative entity ids and the
/// client's local ids. Every replicated entity the client knows has exactly
/// one binding here.
pub struct LocalEntityMap {
    server_to_local: HashMap<EntityId, EntityId>,
    local_to_server: HashMap<EntityId, EntityId>,
}

impl LocalEntityMap {
    pub fn new() -> Self {
        Self {
            server_to_local: HashMap::new(),
            local_to_server: HashMap::new(),
        }
    }

    pub fn insert(&mut self, server: EntityId, local: EntityId) -> Result<(), EntityMapError> {
        if self.server_to_local.contains_key(&server) {
            return Err(EntityMapError::ServerAlreadyBound(server));
        }
        if self.local_to_server.contains_key(&local) {
            return Err(EntityMapError::LocalAlreadyBound(local));
        }
        self.server_to_local.insert(server, local);
        self.local_to_server.insert(local, server);
        Ok(())
    }

    pub fn local(&self, server: EntityId) -> Option<EntityId> {
        self.server_to_local.get(&server).copied()
    }

    pub fn server(&self, local: EntityId) -> Option<EntityId> {
        self.local_to_server.get(&local).copied()
    }

    pub fn contains_server(&self, server: EntityId) -> bool {
        self.server_to_local.contains_key(&server)
    }

    pub fn contains_local(&self, local: EntityId) -> bool {
        self.local_to_server.contains_key(&local)
    }

    /// Removes a binding by server id, returning the local id it pointed to
    pub fn remove_by_server(&mut self, server: EntityId) -> Option<EntityId> {
        let local = self.server_to_local.remove(&server)?;
        self.local_to_server.remove(&local);
        Some(local)
    }

    /// Removes a binding by local id, returning the server id it pointed to
    pub fn remove_by_local(&mut self, local: EntityId) -> Option<EntityId> {
        let server = self.local_to_server.remove(&local)?;
        self.server_to_local.remove(&server);
        Some(server)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.server_to_local.iter().map(|(s, l)| (*s, *l))
    }

    pub fn len(&self) -> usize {
        self.server_to_local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.server_to_local.is_empty()
    }
}

impl Default for LocalEntityMap {
    fn default() -> Self {
        Self::new()
    }
}
