use std::collections::BTreeMap;

use log::warn;
use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};
use thiserror::Error;

use crate::{
    component::{
        dirty::{new_shared_dirty_log, DirtyHandle, DirtyPair, SharedDirtyLog},
        kinds::ComponentTypeId,
        registry::{ComponentRegistry, RegistryError},
        replicate::Replicate,
    },
    hash::ContentHash,
    messages::user_command::UserCommand,
    world::{
        entity::{Entity, EntityId},
        template::{SimContext, TemplateError, TemplateSource},
    },
};

/// Errors that can occur during entity store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(EntityId),

    #[error("entity {entity:?} already has a {name} component")]
    DuplicateComponent {
        entity: EntityId,
        name: &'static str,
    },

    #[error("entity {entity:?} has no component with type id {type_id:?}")]
    NoSuchComponent {
        entity: EntityId,
        type_id: ComponentTypeId,
    },

    #[error("entity {entity:?} has no {name} component")]
    MissingComponent {
        entity: EntityId,
        name: &'static str,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Serde(#[from] SerdeErr),
}

/// Owns every entity on one host, allocates ids, and keeps the shared dirty
/// log that component setters append to. The server's store is authoritative;
/// the client's store holds predicted state and mirrors of replicated
/// entities. One writer per store: all mutation happens on the simulation
/// thread.
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    next_entity_id: u32,
    dirty: SharedDirtyLog,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_entity_id: 1,
            dirty: new_shared_dirty_log(),
        }
    }

    // Entity lifecycle

    pub fn create_entity(&mut self) -> EntityId {
        let entity_id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities.insert(entity_id, Entity::new());
        entity_id
    }

    /// Creates an entity from a named template, delegating component
    /// construction to the application's asset layer. A template that fails
    /// partway leaves no entity behind.
    pub fn create_from_template(
        &mut self,
        template: &str,
        registry: &ComponentRegistry,
        templates: &dyn TemplateSource,
    ) -> Result<EntityId, StoreError> {
        let components = templates.instantiate(template, registry)?;
        let entity_id = self.create_entity();
        for component in components {
            if let Err(err) = self.add_component(entity_id, registry, component) {
                let _ = self.destroy_entity(entity_id);
                return Err(err);
            }
        }
        Ok(entity_id)
    }

    /// Removes an entity, unbinding its components from the dirty log and
    /// purging any of its pending change records.
    pub fn destroy_entity(&mut self, entity_id: EntityId) -> Result<(), StoreError> {
        let Some(mut entity) = self.entities.remove(&entity_id) else {
            return Err(StoreError::NoSuchEntity(entity_id));
        };
        for (_, component) in entity.components_mut() {
            component.unbind_dirty();
        }
        if let Ok(mut log) = self.dirty.lock() {
            log.remove_entity(entity_id);
        }
        Ok(())
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.entities.contains_key(&entity_id)
    }

    pub fn entity(&self, entity_id: EntityId) -> Result<&Entity, StoreError> {
        self.entities
            .get(&entity_id)
            .ok_or(StoreError::NoSuchEntity(entity_id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // Components

    /// Attaches a component, binding it to this store's dirty log. At most
    /// one component per type per entity.
    pub fn add_component(
        &mut self,
        entity_id: EntityId,
        registry: &ComponentRegistry,
        mut component: Box<dyn Replicate>,
    ) -> Result<(), StoreError> {
        let type_id = registry.type_id_of(&component.kind()).ok_or(
            StoreError::Registry(RegistryError::UnregisteredKind {
                name: component.name(),
            }),
        )?;
        let dirty_log = self.dirty.clone();
        let entity = self
            .entities
            .get_mut(&entity_id)
            .ok_or(StoreError::NoSuchEntity(entity_id))?;
        if entity.has(type_id) {
            return Err(StoreError::DuplicateComponent {
                entity: entity_id,
                name: component.name(),
            });
        }
        component.bind_dirty(DirtyHandle::new(entity_id, type_id, dirty_log));
        entity.insert(type_id, component);
        Ok(())
    }

    pub fn component<C: Replicate>(&self, entity_id: EntityId) -> Result<&C, StoreError> {
        self.entity(entity_id)?
            .component_of::<C>()
            .ok_or(StoreError::MissingComponent {
                entity: entity_id,
                name: std::any::type_name::<C>(),
            })
    }

    pub fn component_mut<C: Replicate>(
        &mut self,
        entity_id: EntityId,
    ) -> Result<&mut C, StoreError> {
        let missing = || StoreError::MissingComponent {
            entity: entity_id,
            name: std::any::type_name::<C>(),
        };
        let entity = self
            .entities
            .get_mut(&entity_id)
            .ok_or(StoreError::NoSuchEntity(entity_id))?;

        let mut found = None;
        for (type_id, component) in entity.components_mut() {
            if component.as_ref().as_any().is::<C>() {
                found = Some(type_id);
                break;
            }
        }
        let Some(type_id) = found else {
            return Err(missing());
        };
        let Some(component) = entity.component_mut(type_id) else {
            return Err(missing());
        };
        component.as_mut().downcast_mut::<C>().ok_or_else(missing)
    }

    pub fn component_dyn(
        &self,
        entity_id: EntityId,
        type_id: ComponentTypeId,
    ) -> Result<&dyn Replicate, StoreError> {
        self.entity(entity_id)?
            .component(type_id)
            .ok_or(StoreError::NoSuchComponent {
                entity: entity_id,
                type_id,
            })
    }

    pub fn component_dyn_mut(
        &mut self,
        entity_id: EntityId,
        type_id: ComponentTypeId,
    ) -> Result<&mut dyn Replicate, StoreError> {
        self.entities
            .get_mut(&entity_id)
            .ok_or(StoreError::NoSuchEntity(entity_id))?
            .component_mut(type_id)
            .map(|boxed| boxed.as_mut())
            .ok_or(StoreError::NoSuchComponent {
                entity: entity_id,
                type_id,
            })
    }

    // Queries

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    /// Lazy read-only view over entities passing the filter. Holding the
    /// iterator borrows the store, so nothing can mutate it mid-walk.
    pub fn entities_matching<'s, F>(
        &'s self,
        filter: F,
    ) -> impl Iterator<Item = (EntityId, &'s Entity)> + 's
    where
        F: Fn(&Entity) -> bool + 's,
    {
        self.iter().filter(move |(_, entity)| filter(entity))
    }

    // Simulation

    /// Applies one user command to every component of the entity, in wire
    /// tag order so both hosts integrate identically.
    pub fn apply_command(
        &mut self,
        entity_id: EntityId,
        command: &UserCommand,
        context: &SimContext,
    ) -> Result<(), StoreError> {
        let entity = self
            .entities
            .get_mut(&entity_id)
            .ok_or(StoreError::NoSuchEntity(entity_id))?;
        for (_, component) in entity.components_mut() {
            component.apply_command(command, context);
        }
        Ok(())
    }

    // Wire transfer

    pub fn serialize_component(
        &self,
        entity_id: EntityId,
        type_id: ComponentTypeId,
    ) -> Result<Vec<u8>, StoreError> {
        let component = self.component_dyn(entity_id, type_id)?;
        let mut writer = ByteWriter::new();
        component.write(&mut writer);
        Ok(writer.to_bytes())
    }

    /// Overwrites a component's state from received bytes, creating the
    /// component first when the entity does not have one yet. Does not mark
    /// anything dirty.
    pub fn apply_component_update(
        &mut self,
        entity_id: EntityId,
        type_id: ComponentTypeId,
        registry: &ComponentRegistry,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        let dirty_log = self.dirty.clone();
        let entity = self
            .entities
            .get_mut(&entity_id)
            .ok_or(StoreError::NoSuchEntity(entity_id))?;

        let mut reader = ByteReader::new(bytes);
        if entity.has(type_id) {
            if let Some(component) = entity.component_mut(type_id) {
                component.read(&mut reader)?;
            }
        } else {
            let mut component = registry.create(type_id)?;
            component.read(&mut reader)?;
            component.bind_dirty(DirtyHandle::new(entity_id, type_id, dirty_log));
            entity.insert(type_id, component);
        }
        Ok(())
    }

    /// Digest of the entity's full component set, in wire tag order. Both
    /// hosts compute the same value for the same state, which is what the
    /// predicted-spawn correlation protocol relies on.
    pub fn entity_content_hash(&self, entity_id: EntityId) -> Result<ContentHash, StoreError> {
        let entity = self.entity(entity_id)?;
        let mut writer = ByteWriter::new();
        for (type_id, component) in entity.components() {
            type_id.ser(&mut writer);
            component.write(&mut writer);
        }
        Ok(ContentHash::of_bytes(writer.as_slice()))
    }

    // Dirty tracking

    /// Pending change pairs in the order they were first marked
    pub fn dirty_snapshot(&self) -> Vec<DirtyPair> {
        match self.dirty.lock() {
            Ok(log) => log.snapshot(),
            Err(_) => {
                warn!("dirty log lock is poisoned, treating as empty");
                Vec::new()
            }
        }
    }

    /// Clears exactly the given pairs, from the log and from the component
    /// flags. Pairs that were not sent stay recorded.
    pub fn clear_dirty_pairs(&mut self, pairs: &[DirtyPair]) {
        if let Ok(mut log) = self.dirty.lock() {
            for pair in pairs {
                log.remove(pair);
            }
        }
        for (entity_id, type_id) in pairs {
            if let Some(entity) = self.entities.get_mut(entity_id) {
                if let Some(component) = entity.component_mut(*type_id) {
                    component.clear_dirty();
                }
            }
        }
    }

    /// Drops every pending change record without sending anything
    pub fn discard_dirty(&mut self) {
        let pairs = match self.dirty.lock() {
            Ok(mut log) => {
                let pairs = log.snapshot();
                log.clear();
                pairs
            }
            Err(_) => Vec::new(),
        };
        for (entity_id, type_id) in pairs {
            if let Some(entity) = self.entities.get_mut(&entity_id) {
                if let Some(component) = entity.component_mut(type_id) {
                    component.clear_dirty();
                }
            }
        }
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
