use std::fmt;

use bitflags::bitflags;

use crate::math::{BBox2, V2};
use crate::memory::{Arena, ArenaError, ArenaSlice};

use self::record::EntityRecord;

/// Stable slot handle returned by `EntityStore::add`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntityFlags: u32 {
        const REMOVED = 1 << 0;
        /// Airborne arrows test against this entity
        const COLLIDE = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetKind {
    /// Drifts along its velocity
    Walking,
    /// Bobs vertically around where it spawned
    Flying { origin: V2, amplitude: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    /// Play-area bounds, never drawn
    Space,
    Ground,
    Rope,
    Shooter,
    Arrow { lifetime: f32, on_ground: bool },
    Target(TargetKind),
}

impl EntityKind {
    /// Kinds that start out with `EntityFlags::COLLIDE`
    #[inline]
    pub fn is_collider(&self) -> bool {
        matches!(self, EntityKind::Ground | EntityKind::Target(_))
    }
}

/// `pos` is the center of the entity's box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub flags: EntityFlags,
    pub pos: V2,
    pub size: V2,
    pub vel: V2,
}

impl Entity {
    #[inline]
    pub fn bbox(&self) -> BBox2 {
        BBox2::from_center_size(self.pos, self.size)
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.flags.contains(EntityFlags::REMOVED)
    }

    #[inline]
    pub fn collides(&self) -> bool {
        self.flags.contains(EntityFlags::COLLIDE)
    }
}

// ============================================================================
// Arena Record
// ============================================================================

#[allow(unsafe_code)]
mod record {
    use bytemuck::{Pod, Zeroable};

    use super::{Entity, EntityFlags, EntityId, EntityKind, TargetKind};
    use crate::math::V2;

    const SPACE: u32 = 0;
    const GROUND: u32 = 1;
    const ROPE: u32 = 2;
    const SHOOTER: u32 = 3;
    const ARROW: u32 = 4;
    const WALKING: u32 = 5;
    const FLYING: u32 = 6;

    /// Flat form of `Entity` as it sits in the arena. The kind is a tag plus
    /// the union of every kind's fields.
    #[repr(C)]
    #[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
    pub struct EntityRecord {
        id: u32,
        tag: u32,
        flags: u32,
        on_ground: u32,
        pos: [f32; 2],
        size: [f32; 2],
        vel: [f32; 2],
        lifetime: f32,
        amplitude: f32,
        origin: [f32; 2],
    }

    impl EntityRecord {
        pub fn encode(entity: &Entity) -> Self {
            let mut record = Self {
                id: entity.id.0,
                flags: entity.flags.bits(),
                pos: [entity.pos.x, entity.pos.y],
                size: [entity.size.x, entity.size.y],
                vel: [entity.vel.x, entity.vel.y],
                ..Self::default()
            };
            record.tag = match entity.kind {
                EntityKind::Space => SPACE,
                EntityKind::Ground => GROUND,
                EntityKind::Rope => ROPE,
                EntityKind::Shooter => SHOOTER,
                EntityKind::Arrow {
                    lifetime,
                    on_ground,
                } => {
                    record.lifetime = lifetime;
                    record.on_ground = u32::from(on_ground);
                    ARROW
                },
                EntityKind::Target(TargetKind::Walking) => WALKING,
                EntityKind::Target(TargetKind::Flying { origin, amplitude }) => {
                    record.origin = [origin.x, origin.y];
                    record.amplitude = amplitude;
                    FLYING
                },
            };
            record
        }

        pub fn decode(&self) -> Entity {
            let kind = match self.tag {
                GROUND => EntityKind::Ground,
                ROPE => EntityKind::Rope,
                SHOOTER => EntityKind::Shooter,
                ARROW => EntityKind::Arrow {
                    lifetime: self.lifetime,
                    on_ground: self.on_ground != 0,
                },
                WALKING => EntityKind::Target(TargetKind::Walking),
                FLYING => EntityKind::Target(TargetKind::Flying {
                    origin: V2::new(self.origin[0], self.origin[1]),
                    amplitude: self.amplitude,
                }),
                _ => EntityKind::Space,
            };
            Entity {
                id: EntityId(self.id),
                kind,
                flags: EntityFlags::from_bits_retain(self.flags),
                pos: V2::new(self.pos[0], self.pos[1]),
                size: V2::new(self.size[0], self.size[1]),
                vel: V2::new(self.vel[0], self.vel[1]),
            }
        }

        #[inline]
        pub fn is_removed(&self) -> bool {
            self.flags & EntityFlags::REMOVED.bits() != 0
        }

        #[inline]
        pub fn mark_removed(&mut self) {
            self.flags |= EntityFlags::REMOVED.bits();
        }
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Full { capacity: usize },
    /// The store's arena was reset, so its handles no longer resolve
    Detached,
    Arena(ArenaError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Full { capacity } => {
                write!(f, "entity store is full ({} slots)", capacity)
            },
            StoreError::Detached => write!(f, "entity store arena was reset"),
            StoreError::Arena(e) => write!(f, "entity store: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for StoreError {
    fn from(e: ArenaError) -> Self {
        StoreError::Arena(e)
    }
}

/// Fixed-capacity entity array with a free list, both carved from an arena.
///
/// The store itself only holds handles; every access goes through the arena
/// it was created in. Slots never move. Removal flags the record and pushes
/// its slot on the free list, so removed records stay in the array until
/// reused and every traversal must skip them.
pub struct EntityStore {
    records: ArenaSlice<EntityRecord>,
    free: ArenaSlice<u32>,
    free_len: usize,
    /// One past the highest slot ever handed out
    slot_count: usize,
}

impl EntityStore {
    pub fn new(arena: &mut Arena, capacity: usize) -> Result<Self, ArenaError> {
        let records = arena.push_slice::<EntityRecord>(capacity)?;
        let free = arena.push_slice::<u32>(capacity)?;

        // Popped from the back, so slot 0 is handed out first
        if let Some(slots) = arena.get_mut(free) {
            for (slot, next) in slots.iter_mut().zip((0..capacity as u32).rev()) {
                *slot = next;
            }
        }

        Ok(Self {
            records,
            free,
            free_len: capacity,
            slot_count: 0,
        })
    }

    /// Arena bytes a store of `capacity` slots takes, before alignment
    pub const fn footprint(capacity: usize) -> usize {
        capacity * (std::mem::size_of::<EntityRecord>() + std::mem::size_of::<u32>())
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.capacity() - self.free_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bound for slot traversal
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Take a free slot and initialise it
    pub fn add(
        &mut self,
        arena: &mut Arena,
        kind: EntityKind,
        pos: V2,
        size: V2,
        vel: V2,
    ) -> Result<EntityId, StoreError> {
        if self.free_len == 0 {
            return Err(StoreError::Full {
                capacity: self.capacity(),
            });
        }
        let slot = arena
            .get(self.free)
            .and_then(|free| free.get(self.free_len - 1))
            .copied()
            .ok_or(StoreError::Detached)?;

        let flags = if kind.is_collider() {
            EntityFlags::COLLIDE
        } else {
            EntityFlags::empty()
        };
        let entity = Entity {
            id: EntityId(slot),
            kind,
            flags,
            pos,
            size,
            vel,
        };

        let record = arena
            .get_mut(self.records)
            .and_then(|records| records.get_mut(slot as usize))
            .ok_or(StoreError::Detached)?;
        *record = EntityRecord::encode(&entity);

        self.free_len -= 1;
        self.slot_count = self.slot_count.max(slot as usize + 1);
        Ok(entity.id)
    }

    /// Flag an entity removed and recycle its slot. Returns false, changing
    /// nothing, when the entity is already removed or was never added.
    pub fn remove(&mut self, arena: &mut Arena, id: EntityId) -> bool {
        if id.index() >= self.slot_count {
            return false;
        }
        let Some(record) = arena
            .get_mut(self.records)
            .and_then(|records| records.get_mut(id.index()))
        else {
            return false;
        };
        if record.is_removed() {
            return false;
        }
        record.mark_removed();

        match arena
            .get_mut(self.free)
            .and_then(|free| free.get_mut(self.free_len))
        {
            Some(slot) => {
                *slot = id.0;
                self.free_len += 1;
                true
            },
            None => false,
        }
    }

    /// Live entity by handle
    pub fn get(&self, arena: &Arena, id: EntityId) -> Option<Entity> {
        self.get_slot(arena, id.index())
    }

    /// Live entity in `slot`
    pub fn get_slot(&self, arena: &Arena, slot: usize) -> Option<Entity> {
        if slot >= self.slot_count {
            return None;
        }
        let record = arena.get(self.records)?.get(slot)?;
        (!record.is_removed()).then(|| record.decode())
    }

    /// Write back a live entity. The removed flag is owned by `remove` and
    /// is never set or cleared here.
    pub fn put(&self, arena: &mut Arena, entity: &Entity) -> bool {
        if entity.id.index() >= self.slot_count {
            return false;
        }
        let Some(record) = arena
            .get_mut(self.records)
            .and_then(|records| records.get_mut(entity.id.index()))
        else {
            return false;
        };
        if record.is_removed() {
            return false;
        }

        let mut live = *entity;
        live.flags.remove(EntityFlags::REMOVED);
        *record = EntityRecord::encode(&live);
        true
    }

    /// Live entities in slot order
    pub fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = Entity> + 'a {
        let records = arena.get(self.records).unwrap_or(&[]);
        let used = records.len().min(self.slot_count);
        records[..used]
            .iter()
            .filter(|record| !record.is_removed())
            .map(EntityRecord::decode)
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("live", &self.len())
            .field("slots", &self.slot_count())
            .field("capacity", &self.capacity())
            .finish()
    }
}
