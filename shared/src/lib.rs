//! # Statecast Shared
//! Common functionality shared between statecast-server & statecast-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use statecast_serde as serde;
pub use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

pub mod component;
pub mod hash;
pub mod math;
pub mod messages;
pub mod protocol;
pub mod transport;
pub mod types;
pub mod world;

pub use component::{
    dirty::{new_shared_dirty_log, DirtyFlag, DirtyHandle, DirtyLog, DirtyPair, SharedDirtyLog},
    kinds::{ComponentKind, ComponentTypeId},
    policy::{ReplicationDirection, ReplicationPolicy},
    registry::{ComponentRegistry, RegistryError},
    replicate::Replicate,
    transform::{Transform, MOVE_SPEED},
};
pub use hash::ContentHash;
pub use math::Vec2;
pub use messages::{
    encode_packet,
    entity_update::{ComponentUpdate, EntityUpdate},
    packet_type::PacketType,
    spawn_acks::{AcknowledgeClientSideEntity, AcknowledgeServerSideEntity},
    update_packet::{UpdateEntitiesPacket, DELETE_ENTRY_BYTES, UPDATE_PACKET_BASE_BYTES},
    user_command::{Button, ButtonSet, UserCommand},
};
pub use protocol::{Protocol, ProtocolError, MIN_PACKET_BYTES};
pub use transport::{PacketQueue, PacketSender, SendError};
pub use types::{CommandSeq, HostType, Tick};
pub use world::{
    entity::{Entity, EntityId},
    local_entity_map::{EntityMapError, LocalEntityMap},
    store::{EntityStore, StoreError},
    template::{NoTemplates, SimContext, TemplateError, TemplateSource},
};
