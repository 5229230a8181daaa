//! Shooter game state and its per-frame tick
//!
//! Each frame reads input, then walks the entity array once in slot order.
//! Every live entity is moved, updated and drawn before the next one is
//! touched, so an entity later in the array sees the already-updated state
//! of the ones before it. The entities themselves live in the permanent
//! arena; the collider list is rebuilt in the transient arena each frame.

use super::entity::{Entity, EntityId, EntityKind, EntityStore, StoreError, TargetKind};
use super::{
    AIM_LENGTH_PX, AIM_PULLBACK, AIM_THICKNESS_PX, ARROW_LENGTH_PX, ARROW_LIFETIME, ARROW_SIZE,
    ARROW_SPEED, ARROW_THICKNESS_PX, CHARGE_RATE, FLYING_AMPLITUDE, FLYING_RATE, GRAVITY,
    METERS_PER_PIXEL, PIXELS_PER_METER, ROPE_SPEED, ROPE_TRAVEL_MAX, ROPE_TRAVEL_MIN,
    SHOOTER_SIZE, TARGET_SIZE, TARGET_SPEED,
};
use crate::display::{Color, PixelBuffer, Renderer};
use crate::geometry::{ray_vs_box, Ray2};
use crate::input::{Input, Key, Mouse};
use crate::math::{BBox2, Transform2, V2};
use crate::memory::{Arena, ArenaSlice, GameMemory};

/// What the tick does with an entity after updating it
enum Fate {
    Keep,
    Remove,
    /// Arrow struck a target: both go
    HitTarget(EntityId),
}

pub struct World {
    entities: EntityStore,
    bounds: BBox2,
    rope: EntityId,
    shooter: EntityId,
    /// Cursor in world metres
    mouse_pos: V2,
    time: f32,
    paused: bool,
    charging: bool,
    charge: f32,
}

impl World {
    /// Build the archery range in `arena`: bounds, ground, rope with the
    /// shooter on it, and one walking and one flying target.
    pub fn new(arena: &mut Arena, capacity: usize) -> Result<Self, StoreError> {
        let mut entities = EntityStore::new(arena, capacity)?;

        let bounds = BBox2::from_min_size(V2::new(-10.0, -10.0), V2::new(60.0, 30.0));
        add_box(arena, &mut entities, EntityKind::Space, bounds)?;

        let ground = BBox2::from_min_size(V2::new(-10.0, 0.0), V2::new(60.0, 1.0));
        add_box(arena, &mut entities, EntityKind::Ground, ground)?;

        let rope_box = BBox2::new(V2::new(1.0, 8.0), V2::new(1.05, 28.0));
        let rope = add_box(arena, &mut entities, EntityKind::Rope, rope_box)?;

        let shooter = entities.add(
            arena,
            EntityKind::Shooter,
            V2::new(rope_box.center().x, rope_box.min.y),
            SHOOTER_SIZE,
            V2::ZERO,
        )?;

        let drift = V2::new(-TARGET_SPEED, 0.0);
        entities.add(
            arena,
            EntityKind::Target(TargetKind::Walking),
            V2::new(28.0, 1.5),
            TARGET_SIZE,
            drift,
        )?;

        let origin = V2::new(28.0, 9.0);
        let flying = TargetKind::Flying {
            origin,
            amplitude: FLYING_AMPLITUDE,
        };
        entities.add(arena, EntityKind::Target(flying), origin, TARGET_SIZE, drift)?;

        Ok(Self {
            entities,
            bounds,
            rope,
            shooter,
            mouse_pos: V2::ZERO,
            time: 0.0,
            paused: false,
            charging: false,
            charge: 0.0,
        })
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn bounds(&self) -> BBox2 {
        self.bounds
    }

    pub fn rope(&self) -> EntityId {
        self.rope
    }

    pub fn shooter(&self) -> EntityId {
        self.shooter
    }

    pub fn mouse_pos(&self) -> V2 {
        self.mouse_pos
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    /// Add an airborne arrow
    pub fn spawn_arrow(
        &mut self,
        arena: &mut Arena,
        pos: V2,
        vel: V2,
    ) -> Result<EntityId, StoreError> {
        let kind = EntityKind::Arrow {
            lifetime: ARROW_LIFETIME,
            on_ground: false,
        };
        self.entities.add(arena, kind, pos, ARROW_SIZE, vel)
    }

    /// Run one frame. While paused nothing advances and `buffer` is left as
    /// it was.
    pub fn update_and_render(
        &mut self,
        input: &Input,
        memory: &mut GameMemory,
        renderer: &Renderer,
        buffer: &mut PixelBuffer,
    ) {
        if input.keyboard.is_pressed(Key::P) {
            self.paused = !self.paused;
            log::info!("{}", if self.paused { "paused" } else { "resumed" });
        }
        if self.paused {
            return;
        }

        let dt = input.dt;
        self.time += dt;

        renderer.clear(buffer, Color::BLACK);

        self.steer_rope(&mut memory.permanent, input);
        self.mouse_pos = screen_to_world(&input.mouse, buffer.height());
        self.update_charge(&mut memory.permanent, input);

        let listed = self.collect_colliders(&memory.permanent, &mut memory.transient);
        let colliders = listed.and_then(|slice| memory.transient.get(slice));
        let permanent = &mut memory.permanent;

        for slot in 0..self.entities.slot_count() {
            let Some(mut entity) = self.entities.get_slot(permanent, slot) else {
                continue;
            };

            let fate = self.update_entity(permanent, &mut entity, dt, colliders);
            self.entities.put(permanent, &entity);

            match fate {
                Fate::Keep => self.draw_entity(&entity, renderer, buffer),
                Fate::Remove => {
                    if matches!(entity.kind, EntityKind::Arrow { .. }) {
                        log::debug!("arrow {:?} expired", entity.id);
                    }
                    self.entities.remove(permanent, entity.id);
                },
                Fate::HitTarget(target) => {
                    log::debug!("arrow {:?} hit target {:?}", entity.id, target);
                    self.entities.remove(permanent, target);
                    self.entities.remove(permanent, entity.id);
                },
            }
        }

        self.draw_aim(permanent, renderer, buffer);
    }

    fn steer_rope(&self, permanent: &mut Arena, input: &Input) {
        let vy = if input.keyboard.is_down(Key::W) {
            ROPE_SPEED
        } else if input.keyboard.is_down(Key::S) {
            -ROPE_SPEED
        } else {
            0.0
        };
        if let Some(mut rope) = self.entities.get(permanent, self.rope) {
            rope.vel.y = vy;
            self.entities.put(permanent, &rope);
        }
    }

    /// Trigger held: build up charge. Trigger released: loose an arrow.
    fn update_charge(&mut self, permanent: &mut Arena, input: &Input) {
        if input.mouse.left.is_down || input.keyboard.is_down(Key::Space) {
            self.charging = true;
        } else {
            if self.charging {
                self.release_arrow(permanent);
            }
            self.charging = false;
            self.charge = 0.0;
        }

        if self.charging {
            self.charge = (self.charge + CHARGE_RATE).min(1.0);
        }
    }

    fn release_arrow(&mut self, permanent: &mut Arena) {
        let Some(origin) = self.entities.get(permanent, self.shooter).map(|s| s.pos) else {
            return;
        };
        // Cursor on the shooter gives no direction to fire in
        let Some(dir) = (self.mouse_pos - origin).try_normalize() else {
            return;
        };
        if self.charge <= 0.0 {
            return;
        }

        let vel = dir * (ARROW_SPEED * self.charge);
        match self.spawn_arrow(permanent, origin, vel) {
            Ok(id) => log::debug!("arrow {:?} released at {:.1} m/s", id, vel.length()),
            Err(e) => log::warn!("arrow not spawned: {}", e),
        }
    }

    /// Slots of everything an arrow can hit, as of the start of the frame.
    /// `None` when the list does not fit; arrows then scan every slot.
    fn collect_colliders(
        &self,
        permanent: &Arena,
        transient: &mut Arena,
    ) -> Option<ArenaSlice<u32>> {
        let count = self.entities.iter(permanent).filter(Entity::collides).count();
        let slice = match transient.push_slice::<u32>(count) {
            Ok(slice) => slice,
            Err(e) => {
                log::warn!("scanning all slots for collisions: {}", e);
                return None;
            },
        };

        let colliders = self.entities.iter(permanent).filter(Entity::collides);
        for (dst, entity) in transient.get_mut(slice)?.iter_mut().zip(colliders) {
            *dst = entity.id.index() as u32;
        }
        Some(slice)
    }

    fn update_entity(
        &self,
        permanent: &Arena,
        entity: &mut Entity,
        dt: f32,
        colliders: Option<&[u32]>,
    ) -> Fate {
        // Move
        match entity.kind {
            EntityKind::Arrow {
                on_ground: false, ..
            } => {
                entity.vel += V2::new(0.0, GRAVITY * dt);
                let delta = entity.vel * dt;

                if delta.length_sq() > 0.0 {
                    let hit = self.first_hit(permanent, entity, delta, colliders);
                    let t = hit.map_or(1.0, |(t, _)| t);
                    entity.pos += delta * t;

                    match hit.map(|(_, other)| other) {
                        Some(other) if other.kind == EntityKind::Ground => {
                            if let EntityKind::Arrow { on_ground, .. } = &mut entity.kind {
                                *on_ground = true;
                            }
                        },
                        Some(other) => return Fate::HitTarget(other.id),
                        None => {},
                    }
                }
            },
            EntityKind::Arrow { .. } => {},
            _ => entity.pos += entity.vel * dt,
        }

        // Per-kind rules
        match &mut entity.kind {
            EntityKind::Rope => {
                let bbox = BBox2::from_center_size(entity.pos, entity.size);
                let min_y = bbox.min.y.clamp(ROPE_TRAVEL_MIN, ROPE_TRAVEL_MAX);
                entity.pos = bbox.with_min(V2::new(bbox.min.x, min_y)).center();
            },
            EntityKind::Shooter => {
                if let Some(rope) = self.entities.get(permanent, self.rope) {
                    entity.pos.y = rope.bbox().min.y;
                }
            },
            EntityKind::Arrow {
                lifetime,
                on_ground,
            } => {
                if *on_ground {
                    *lifetime -= dt;
                }
                if *lifetime <= 0.0 || !self.bounds.contains(entity.pos) {
                    return Fate::Remove;
                }
            },
            EntityKind::Target(kind) => {
                if let TargetKind::Flying { origin, amplitude } = *kind {
                    entity.pos.y = (FLYING_RATE * self.time).sin() * amplitude + origin.y;
                }
                if !self.bounds.contains(entity.pos) {
                    return Fate::Remove;
                }
            },
            EntityKind::Space | EntityKind::Ground => {},
        }

        Fate::Keep
    }

    /// Earliest collider the arrow's displacement touches, with the
    /// fraction of `delta` travelled before contact
    fn first_hit(
        &self,
        permanent: &Arena,
        arrow: &Entity,
        delta: V2,
        colliders: Option<&[u32]>,
    ) -> Option<(f32, Entity)> {
        let mut best: Option<(f32, Entity)> = None;

        let mut consider = |slot: usize| {
            if slot == arrow.id.index() {
                return;
            }
            // Removed this frame, or never a collider
            let Some(other) = self.entities.get_slot(permanent, slot).filter(Entity::collides)
            else {
                return;
            };

            // Test in the collider's frame so its box sits at the origin
            let bound = BBox2::from_center_size(V2::ZERO, other.size);
            let motion = Ray2::new(arrow.pos - other.pos, delta);
            if let Some(intersection) = ray_vs_box(&motion, &bound) {
                if intersection.t < best.map_or(1.0, |(t, _)| t) {
                    best = Some((intersection.t, other));
                }
            }
        };

        match colliders {
            Some(slots) => slots.iter().for_each(|&slot| consider(slot as usize)),
            None => (0..self.entities.slot_count()).for_each(&mut consider),
        }
        best
    }

    fn draw_entity(&self, entity: &Entity, renderer: &Renderer, buffer: &mut PixelBuffer) {
        match entity.kind {
            EntityKind::Space => {},
            EntityKind::Arrow { .. } => {
                let screen = entity.pos * PIXELS_PER_METER;
                let transform =
                    Transform2::rotation(entity.vel.angle()).translate_by(screen.x, screen.y);
                // Trails back from the tip at the entity position
                let shape = BBox2::from_min_size(
                    V2::new(-ARROW_LENGTH_PX, -ARROW_THICKNESS_PX * 0.5),
                    V2::new(ARROW_LENGTH_PX, ARROW_THICKNESS_PX),
                );
                renderer.draw_oriented_box(buffer, &transform, &shape, Color::GREEN);
            },
            _ => {
                let shape = BBox2::from_center_size(
                    entity.pos * PIXELS_PER_METER,
                    entity.size * PIXELS_PER_METER,
                );
                renderer.draw_oriented_box(buffer, &Transform2::identity(), &shape, Color::WHITE);
            },
        }
    }

    /// Bar from the shooter toward the cursor, drawn back as charge builds
    fn draw_aim(&self, permanent: &Arena, renderer: &Renderer, buffer: &mut PixelBuffer) {
        let Some(shooter) = self.entities.get(permanent, self.shooter) else {
            return;
        };

        let dir = self.mouse_pos - shooter.pos;
        let screen = shooter.pos * PIXELS_PER_METER;
        let pullback = -self.charge * AIM_PULLBACK * PIXELS_PER_METER;

        let transform = Transform2::rotation(dir.angle()).translate_by(screen.x, screen.y);
        let shape = BBox2::from_min_size(
            V2::new(pullback, -AIM_THICKNESS_PX * 0.5),
            V2::new(AIM_LENGTH_PX, AIM_THICKNESS_PX),
        );
        renderer.draw_oriented_box(buffer, &transform, &shape, Color::GREEN);
    }
}

fn add_box(
    arena: &mut Arena,
    store: &mut EntityStore,
    kind: EntityKind,
    bbox: BBox2,
) -> Result<EntityId, StoreError> {
    store.add(arena, kind, bbox.center(), bbox.size(), V2::ZERO)
}

/// Window pixels (origin top-left) to world metres (origin bottom-left)
fn screen_to_world(mouse: &Mouse, window_height: u32) -> V2 {
    V2::new(mouse.x as f32, (window_height as i32 - mouse.y) as f32) * METERS_PER_PIXEL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, InputTracker, MouseButtonKind};
    use crate::memory::kilobytes;
    use crate::shooter::EntityFlags;

    const DT: f32 = 1.0 / 60.0;

    struct Harness {
        world: World,
        tracker: InputTracker,
        memory: GameMemory,
        renderer: Renderer,
        buffer: PixelBuffer,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_transient(kilobytes(4))
        }

        fn with_transient(transient: usize) -> Self {
            let mut memory = GameMemory::new(kilobytes(64), transient).unwrap();
            Self {
                world: World::new(&mut memory.permanent, 64).unwrap(),
                tracker: InputTracker::new(),
                memory,
                renderer: Renderer::new(),
                buffer: PixelBuffer::with_size(960, 540),
            }
        }

        fn step(&mut self, events: &[InputEvent]) {
            self.tracker.begin_frame(DT);
            for &event in events {
                self.tracker.apply(event);
            }
            self.memory.transient.reset();
            self.world.update_and_render(
                self.tracker.input(),
                &mut self.memory,
                &self.renderer,
                &mut self.buffer,
            );
        }

        fn run(&mut self, frames: usize) {
            for _ in 0..frames {
                self.step(&[]);
            }
        }

        fn entity(&self, id: EntityId) -> Option<Entity> {
            self.world.entities().get(&self.memory.permanent, id)
        }

        fn edit(&mut self, id: EntityId, f: impl FnOnce(&mut Entity)) {
            let mut entity = self.entity(id).unwrap();
            f(&mut entity);
            assert!(self.world.entities().put(&mut self.memory.permanent, &entity));
        }

        fn spawn_arrow(&mut self, pos: V2, vel: V2) -> EntityId {
            self.world
                .spawn_arrow(&mut self.memory.permanent, pos, vel)
                .unwrap()
        }

        fn find(&self, pred: impl Fn(&Entity) -> bool) -> Option<Entity> {
            self.world.entities().iter(&self.memory.permanent).find(|e| pred(e))
        }

        fn count(&self, pred: impl Fn(&Entity) -> bool) -> usize {
            self.world
                .entities()
                .iter(&self.memory.permanent)
                .filter(|e| pred(e))
                .count()
        }
    }

    fn is_arrow(e: &Entity) -> bool {
        matches!(e.kind, EntityKind::Arrow { .. })
    }

    fn is_target(e: &Entity) -> bool {
        matches!(e.kind, EntityKind::Target(_))
    }

    fn is_walker(e: &Entity) -> bool {
        e.kind == EntityKind::Target(TargetKind::Walking)
    }

    #[test]
    fn test_scene_layout() {
        let mut arena = Arena::new("permanent", kilobytes(4)).unwrap();
        let world = World::new(&mut arena, 16).unwrap();
        assert_eq!(world.entities().len(), 6);

        let rope = world.entities().get(&arena, world.rope()).unwrap();
        assert!(rope.bbox().min.approx_eq(V2::new(1.0, 8.0), 1e-5));
        let shooter = world.entities().get(&arena, world.shooter()).unwrap();
        assert!(shooter.pos.approx_eq(V2::new(1.025, 8.0), 1e-5));
        assert_eq!(shooter.size, SHOOTER_SIZE);

        let ground = world.entities().get_slot(&arena, 1).unwrap();
        assert_eq!(ground.kind, EntityKind::Ground);
        assert!(ground.bbox().max.approx_eq(V2::new(50.0, 1.0), 1e-5));
        assert_eq!(world.bounds().min, V2::new(-10.0, -10.0));
    }

    #[test]
    fn test_scene_needs_six_slots() {
        let mut arena = Arena::new("permanent", kilobytes(4)).unwrap();
        assert_eq!(
            World::new(&mut arena, 5).err(),
            Some(StoreError::Full { capacity: 5 })
        );
        assert!(World::new(&mut arena, 6).is_ok());
    }

    #[test]
    fn test_scene_needs_room_in_the_arena() {
        let mut arena = Arena::new("permanent", 256).unwrap();
        assert!(matches!(World::new(&mut arena, 64), Err(StoreError::Arena(_))));
    }

    #[test]
    fn test_rope_travel_is_clamped_and_carries_shooter() {
        let mut h = Harness::new();
        let (rope, shooter) = (h.world.rope(), h.world.shooter());

        h.step(&[InputEvent::KeyDown(Key::W)]);
        h.run(120);
        let top = h.entity(rope).unwrap().bbox().min.y;
        assert!((top - ROPE_TRAVEL_MAX).abs() < 1e-4);
        assert!((h.entity(shooter).unwrap().pos.y - top).abs() < 1e-4);

        h.step(&[InputEvent::KeyUp(Key::W), InputEvent::KeyDown(Key::S)]);
        h.run(120);
        let bottom = h.entity(rope).unwrap().bbox().min.y;
        assert!((bottom - ROPE_TRAVEL_MIN).abs() < 1e-4);
        assert!((h.entity(shooter).unwrap().pos.y - bottom).abs() < 1e-4);

        h.step(&[InputEvent::KeyUp(Key::S)]);
        assert_eq!(h.entity(rope).unwrap().vel, V2::ZERO);
    }

    #[test]
    fn test_charge_builds_and_release_fires_toward_cursor() {
        let mut h = Harness::new();
        // Cursor 10 m right of the shooter at the same height (y = 8 m)
        let (mx, my) = ((11.025 * PIXELS_PER_METER) as i32, 540 - 8 * 32);
        h.step(&[
            InputEvent::MouseMove { x: mx, y: my },
            InputEvent::KeyDown(Key::Space),
        ]);
        assert!((h.world.charge() - CHARGE_RATE).abs() < 1e-6);
        h.run(30);
        assert_eq!(h.world.charge(), 1.0);
        assert_eq!(h.count(is_arrow), 0);

        h.step(&[InputEvent::KeyUp(Key::Space)]);
        assert_eq!(h.world.charge(), 0.0);
        assert_eq!(h.count(is_arrow), 1);
        let arrow = h.find(is_arrow).unwrap();
        // Fired horizontally at full speed, then one frame of gravity
        assert!((arrow.vel.x - ARROW_SPEED).abs() < 0.05);
        assert!((arrow.vel.y - GRAVITY * DT).abs() < 0.05);
        assert!(arrow.pos.x > 1.025);
    }

    #[test]
    fn test_mouse_button_also_charges() {
        let mut h = Harness::new();
        let down = InputEvent::MouseDown {
            x: 900,
            y: 100,
            button: MouseButtonKind::Left,
        };
        h.step(&[down]);
        h.step(&[]);
        assert!((h.world.charge() - 2.0 * CHARGE_RATE).abs() < 1e-6);
        h.step(&[InputEvent::MouseUp {
            x: 900,
            y: 100,
            button: MouseButtonKind::Left,
        }]);
        assert_eq!(h.count(is_arrow), 1);
    }

    #[test]
    fn test_release_on_the_shooter_fires_nothing() {
        let mut h = Harness::new();
        // Move the shooter onto a whole pixel so the cursor can sit on it
        h.edit(h.world.shooter(), |s| s.pos = V2::new(1.0, 8.0));
        h.edit(h.world.rope(), |r| r.pos.x = 1.0);
        let cursor = InputEvent::MouseMove { x: 32, y: 540 - 256 };

        h.step(&[cursor, InputEvent::KeyDown(Key::Space)]);
        h.step(&[InputEvent::KeyUp(Key::Space)]);
        assert_eq!(h.count(is_arrow), 0);
    }

    #[test]
    fn test_arrow_hits_walking_target() {
        let mut h = Harness::new();
        let arrow = h.spawn_arrow(V2::new(26.0, 1.5), V2::new(60.0, 0.0));
        assert_eq!(h.count(is_target), 2);

        h.step(&[]);
        assert!(h.entity(arrow).is_some());
        h.step(&[]);
        assert!(h.entity(arrow).is_none());
        assert_eq!(h.count(is_target), 1);
        // Both slots went back to the free list
        assert_eq!(h.world.entities().len(), 5);
    }

    #[test]
    fn test_second_arrow_passes_through_target_removed_this_frame() {
        let mut h = Harness::new();
        let first = h.spawn_arrow(V2::new(26.0, 1.5), V2::new(60.0, 0.0));
        let second = h.spawn_arrow(V2::new(26.0, 1.6), V2::new(60.0, 0.0));

        h.run(2);
        // The first arrow took the target; the second, later in slot order,
        // must not collide with the removed target's slot
        assert!(h.entity(first).is_none());
        assert_eq!(h.count(is_walker), 0);
        let survivor = h.entity(second).unwrap();
        assert!(matches!(
            survivor.kind,
            EntityKind::Arrow {
                on_ground: false,
                ..
            }
        ));

        h.step(&[]);
        let survivor = h.entity(second).unwrap();
        assert!(survivor.pos.x > 28.5);
        assert_eq!(h.world.entities().len(), 6);
    }

    #[test]
    fn test_arrow_ignores_entities_without_collide_flag() {
        let mut h = Harness::new();
        let walker = h.find(is_walker).unwrap().id;
        h.edit(walker, |w| w.flags.remove(EntityFlags::COLLIDE));
        let arrow = h.spawn_arrow(V2::new(26.0, 1.5), V2::new(60.0, 0.0));

        h.run(3);
        assert!(h.entity(walker).is_some());
        assert!(h.entity(arrow).unwrap().pos.x > 28.5);
    }

    #[test]
    fn test_arrow_sticks_in_ground_then_expires() {
        let mut h = Harness::new();
        let arrow = h.spawn_arrow(V2::new(5.0, 3.0), V2::new(0.0, -60.0));

        h.run(2);
        let stuck = h.entity(arrow).unwrap();
        assert!(matches!(
            stuck.kind,
            EntityKind::Arrow {
                on_ground: true,
                ..
            }
        ));
        assert!((stuck.pos.y - 1.0).abs() < 1e-3);

        h.run(60);
        let still = h.entity(arrow).unwrap();
        assert_eq!(still.pos, stuck.pos);

        h.run(70);
        assert!(h.entity(arrow).is_none());
    }

    #[test]
    fn test_collisions_still_run_without_scratch_space() {
        let mut h = Harness::with_transient(0);
        let arrow = h.spawn_arrow(V2::new(5.0, 3.0), V2::new(0.0, -60.0));

        h.run(2);
        let stuck = h.entity(arrow).unwrap();
        assert!(matches!(
            stuck.kind,
            EntityKind::Arrow {
                on_ground: true,
                ..
            }
        ));
        assert!((stuck.pos.y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_arrow_leaving_bounds_is_removed() {
        let mut h = Harness::new();
        let arrow = h.spawn_arrow(V2::new(45.0, 15.0), V2::new(60.0, 0.0));
        h.run(3);
        assert!(h.entity(arrow).is_some());
        h.run(5);
        assert!(h.entity(arrow).is_none());
    }

    #[test]
    fn test_targets_walk_off_and_are_removed() {
        let mut h = Harness::new();
        h.buffer = PixelBuffer::with_size(64, 36);
        h.run(60);
        let walker = h.find(is_walker).unwrap();
        assert!((walker.pos.x - (28.0 - TARGET_SPEED)).abs() < 1e-3);

        // 38 m at 2 m/s takes 19 s
        h.run(60 * 20);
        assert_eq!(h.count(is_target), 0);
        assert_eq!(h.world.entities().len(), 4);
    }

    #[test]
    fn test_flying_target_bobs_around_origin() {
        let mut h = Harness::new();
        h.buffer = PixelBuffer::with_size(64, 36);
        let mut lowest = f32::MAX;
        let mut highest = f32::MIN;
        for _ in 0..200 {
            h.step(&[]);
            let flyer = h
                .find(|e| matches!(e.kind, EntityKind::Target(TargetKind::Flying { .. })))
                .unwrap();
            let expected = (FLYING_RATE * h.world.time()).sin() * FLYING_AMPLITUDE + 9.0;
            assert!((flyer.pos.y - expected).abs() < 1e-4);
            lowest = lowest.min(flyer.pos.y);
            highest = highest.max(flyer.pos.y);
        }
        assert!(lowest < 7.1 && highest > 10.9);
    }

    #[test]
    fn test_pause_freezes_world_and_frame() {
        let mut h = Harness::new();
        h.step(&[]);
        let time = h.world.time();

        h.buffer.clear(0x1234_5678);
        h.step(&[InputEvent::KeyDown(Key::P)]);
        assert!(h.world.is_paused());
        h.step(&[InputEvent::KeyUp(Key::P)]);
        h.run(10);
        assert_eq!(h.world.time(), time);
        assert!(h.buffer.pixels().iter().all(|&p| p == 0x1234_5678));

        h.step(&[InputEvent::KeyDown(Key::P)]);
        assert!(!h.world.is_paused());
        assert!(h.world.time() > time);
    }

    #[test]
    fn test_frame_shows_ground_and_not_space() {
        let mut h = Harness::new();
        h.step(&[]);
        let white = h.renderer.encode_color(Color::WHITE);
        let black = h.renderer.encode_color(Color::BLACK);
        // Ground covers the bottom metre of the screen
        assert_eq!(h.buffer.get_pixel(480, 10), Some(white));
        // Open sky, away from the rope, the shooter and both targets
        assert_eq!(h.buffer.get_pixel(600, 400), Some(black));
    }

    #[test]
    fn test_aim_bar_points_at_cursor() {
        let mut h = Harness::new();
        // Cursor straight right of the shooter
        h.step(&[InputEvent::MouseMove { x: 900, y: 540 - 256 }]);
        let green = h.renderer.encode_color(Color::GREEN);
        // Shooter centre is (32.8, 256) px; bar runs 32 px toward +x
        assert_eq!(h.buffer.get_pixel(60, 256), Some(green));
        assert_ne!(h.buffer.get_pixel(33, 300), Some(green));
    }

    #[test]
    fn test_screen_to_world_flips_y() {
        let mouse = Mouse {
            x: 64,
            y: 540,
            ..Mouse::default()
        };
        assert_eq!(screen_to_world(&mouse, 540), V2::new(2.0, 0.0));
        let mouse = Mouse {
            x: 0,
            y: 0,
            ..Mouse::default()
        };
        assert_eq!(screen_to_world(&mouse, 540), V2::new(0.0, 540.0 / 32.0));
    }
}
