//! Fixed timestep simulation tick
//!
//! One tick runs three phases in order:
//! 1. Resolve at most one click into selection changes or orders
//! 2. Step every entity in slot order (swings, deaths, attacks, movement)
//! 3. Settle everything that moved on the terrain

use glam::Vec2;

use super::collision::resolve_overlaps;
use super::entity::Entity;
use super::state::{AttackPhase, EntityState};
use super::world::{EntityId, World};
use crate::camera::{ClickEvent, ClickKind};
use crate::geom::Rect;
use crate::ground;
use crate::terrain::TerrainMap;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Click taken from the camera this tick, if any
    pub click: Option<ClickEvent>,
    /// Ray range used when an order is cast against the ground
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            click: None,
            near_plane: 0.0,
            far_plane: 1000.0,
        }
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, terrain: &TerrainMap, input: &TickInput, dt: f32) {
    if let Some(click) = input.click {
        resolve_click(world, terrain, &click, input);
    }

    for id in world.ids() {
        step_entity(world, id, dt);
    }

    world.flush_dirty(terrain);
    world.time_ticks += 1;
}

fn resolve_click(world: &mut World, terrain: &TerrainMap, click: &ClickEvent, input: &TickInput) {
    let selected = world.selection().len();
    match *click {
        ClickEvent::Pick { kind: ClickKind::Select, ray } => {
            let picked = world.pick(&ray);
            world.selection_mut().clear();
            if let Some(id) = picked {
                world.selection_mut().add(id);
            }
        }
        ClickEvent::Pick {
            kind: ClickKind::SelectAdd,
            ray,
        } => {
            if let Some(id) = world.pick(&ray) {
                world.selection_mut().toggle(id);
            }
        }
        ClickEvent::Pick {
            kind: ClickKind::OrderAttack,
            ray,
        } => {
            if let Some(target) = world.pick(&ray) {
                world.order_attack(target);
            }
        }
        ClickEvent::Pick { kind: ClickKind::Order, ray } => {
            // A ray that never meets the ground issues nothing
            if let Some(hit) = terrain.ray_ground_hit(&ray, input.near_plane, input.far_plane) {
                world.order_move(ground(hit));
            }
        }
        ClickEvent::Rect {
            rect,
            add,
            view_projection,
            viewport,
        } => {
            world.box_select(rect, add, &view_projection, viewport);
        }
    }
    if world.selection().len() != selected {
        log::debug!("Selection now holds {} entities", world.selection().len());
    }
}

fn step_entity(world: &mut World, id: EntityId, dt: f32) {
    let Some(entity) = world.get(id) else {
        return;
    };
    if !entity.is_actor() {
        return;
    }

    let state = entity.state;
    match state {
        EntityState::AttackResolving { target } => {
            resolve_swing(world, id, target);
            return;
        }
        EntityState::Dying => {
            if let Some(entity) = world.get_mut(id) {
                if entity.anim.advance_once() {
                    entity.state = EntityState::Dead;
                    log::debug!("{:?} is dead", id);
                }
            }
            return;
        }
        EntityState::Dead => return,
        EntityState::Attacking { target, .. } => update_attack(world, id, target, dt),
        EntityState::Idle | EntityState::Moving { .. } => {}
    }

    step_movement(world, id, dt);

    if let Some(entity) = world.get_mut(id) {
        if !entity.state.is_action() {
            entity.anim.advance_loop();
        }
    }
}

/// Play out the swing; damage lands on its final frame
fn resolve_swing(world: &mut World, id: EntityId, target: EntityId) {
    let Some(attacker) = world.get_mut(id) else {
        return;
    };
    if !attacker.anim.advance_once() {
        return;
    }
    let damage = attacker.attack_damage;

    let target_alive = match world.get_mut(target) {
        Some(victim) if victim.is_actor() => {
            if victim.take_damage(damage) {
                log::info!("{:?} killed {:?}", id, target);
            }
            !victim.state.is_dead()
        }
        _ => false,
    };

    if let Some(attacker) = world.get_mut(id) {
        attacker.finish_swing(target, target_alive);
    }
}

/// Range and cooldown checks for an attacker between swings
fn update_attack(world: &mut World, id: EntityId, target: EntityId, dt: f32) {
    let target_pos = world
        .get(target)
        .filter(|t| !t.state.is_dead())
        .map(Entity::ground_position);

    let Some(attacker) = world.get_mut(id) else {
        return;
    };
    let Some(target_pos) = target_pos else {
        log::debug!("{:?} lost its target {:?}", id, target);
        attacker.stand_down();
        return;
    };

    if attacker.in_attack_range(target_pos) {
        if attacker.attack_cooldown <= 0.0 {
            attacker.begin_swing(target);
        } else if attacker.state.is_moving() {
            attacker.state = attacker.state.stop_moving();
            attacker.anim.play(attacker.animations.idle);
        }
    } else {
        attacker.state = EntityState::Attacking {
            target,
            phase: AttackPhase::Pursuing { point: target_pos },
        };
        attacker.anim.ensure(attacker.animations.moving);
    }
    attacker.attack_cooldown = (attacker.attack_cooldown - dt).max(0.0);
}

/// Walk towards the current move target and push out of other footprints
fn step_movement(world: &mut World, id: EntityId, dt: f32) {
    let Some(entity) = world.get(id) else {
        return;
    };
    let Some(target) = entity.state.move_target() else {
        return;
    };
    let here = entity.ground_position();

    if here == target {
        arrive(world, id);
        return;
    }

    let to_target = target - here;
    let distance = to_target.length();
    let max_step = entity.move_speed * dt;
    let (step, arrived) = if distance <= max_step {
        (to_target, true)
    } else {
        (to_target / distance * max_step, false)
    };
    let moved_to = if arrived { target } else { here + step };

    let mut footprint = entity.footprint();
    footprint.translate(moved_to - here);
    let others: Vec<Rect> = world
        .entities()
        .filter(|&(other, e)| other != id && e.is_actor())
        .map(|(_, e)| e.footprint())
        .collect();
    let push = resolve_overlaps(footprint, moved_to, others);

    let Some(entity) = world.get_mut(id) else {
        return;
    };
    entity.rotation.y = step.x.atan2(step.y);
    let settled_at = moved_to + push;
    entity.position.x = settled_at.x;
    entity.position.z = settled_at.y;
    // Pushed off the target: keep walking and check again next tick
    if arrived && push == Vec2::ZERO {
        arrive(world, id);
    }
    world.mark_dirty(id);
}

fn arrive(world: &mut World, id: EntityId) {
    if let Some(entity) = world.get_mut(id) {
        entity.state = entity.state.stop_moving();
        entity.anim.play(entity.animations.idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Ray;
    use crate::settings::UnitTemplate;
    use crate::sim::{EntityKind, Team};
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    struct Scene {
        world: World,
        terrain: TerrainMap,
    }

    impl Scene {
        fn new(elevation: f32) -> Self {
            Self {
                world: World::new(8),
                terrain: TerrainMap::flat(64, 64, elevation).unwrap(),
            }
        }

        fn spawn(&mut self, team: Team, at: Vec2) -> EntityId {
            let id = self.world.spawn(&UnitTemplate::default().spawn(team, at));
            self.world.flush_dirty(&self.terrain);
            id
        }

        fn step(&mut self) {
            tick(&mut self.world, &self.terrain, &TickInput::default(), DT);
        }

        fn click(&mut self, click: ClickEvent) {
            let input = TickInput {
                click: Some(click),
                ..Default::default()
            };
            tick(&mut self.world, &self.terrain, &input, DT);
        }

        fn entity(&self, id: EntityId) -> &Entity {
            self.world.get(id).unwrap()
        }
    }

    /// Straight down onto ground point `at`
    fn ray_down(at: Vec2) -> Ray {
        Ray::new(Vec3::new(at.x, 50.0, at.y), Vec3::NEG_Y)
    }

    fn pick(kind: ClickKind, at: Vec2) -> ClickEvent {
        ClickEvent::Pick {
            kind,
            ray: ray_down(at),
        }
    }

    #[test]
    fn test_select_click_replaces_or_clears() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Player, Vec2::new(5.0, 0.0));

        scene.click(pick(ClickKind::Select, Vec2::ZERO));
        assert_eq!(scene.world.selection().iter().collect::<Vec<_>>(), vec![a]);

        scene.click(pick(ClickKind::SelectAdd, Vec2::new(5.0, 0.0)));
        assert!(scene.world.selection().contains(a) && scene.world.selection().contains(b));

        scene.click(pick(ClickKind::SelectAdd, Vec2::ZERO));
        assert_eq!(scene.world.selection().iter().collect::<Vec<_>>(), vec![b]);

        // Clicking empty ground clears
        scene.click(pick(ClickKind::Select, Vec2::new(-20.0, -20.0)));
        assert!(scene.world.selection().is_empty());
        assert_eq!(scene.world.last_picked(), None);
    }

    #[test]
    fn test_one_tick_moves_by_speed_times_dt() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        scene.world.selection_mut().add(a);
        let target = Vec2::new(30.0, 40.0);
        scene.world.order_move(target);

        scene.step();
        let entity = scene.entity(a);
        let travelled = 50.0 - entity.ground_position().distance(target);
        assert!((travelled - entity.move_speed * DT).abs() < 1e-4);
        assert!((entity.rotation.y - 30.0f32.atan2(40.0)).abs() < 1e-5);
        assert!(entity.state.is_moving());
        assert_eq!(entity.anim.clip, entity.animations.moving);
    }

    #[test]
    fn test_arrives_exactly_within_one_step() {
        let mut scene = Scene::new(1.5);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        scene.world.selection_mut().add(a);
        let target = Vec2::new(0.03, -0.04);
        scene.world.order_move(target);

        scene.step();
        let entity = scene.entity(a);
        assert_eq!(entity.ground_position(), target);
        assert_eq!(entity.state, EntityState::Idle);
        assert_eq!(entity.anim.clip, entity.animations.idle);
        assert!((entity.position.y - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_order_to_current_spot_stops() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::new(2.0, 2.0));
        scene.world.selection_mut().add(a);
        scene.world.order_move(Vec2::new(2.0, 2.0));
        scene.step();
        assert_eq!(scene.entity(a).state, EntityState::Idle);
        assert_eq!(scene.entity(a).ground_position(), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_move_pushes_out_of_neighbour() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Player, Vec2::new(0.9, 0.0));
        scene.world.selection_mut().add(a);
        scene.world.order_move(Vec2::new(0.0, 0.05));

        scene.step();
        let mover = scene.entity(a);
        assert!((mover.ground_position() - Vec2::new(-0.1, 0.05)).length() < 1e-5);
        let overlap = mover
            .footprint()
            .intersection(&scene.entity(b).footprint())
            .map_or(0.0, |r| r.width());
        assert!(overlap < 1e-5);
        // The bbox followed the push
        let bbox_x = (mover.bbox.min.x + mover.bbox.max.x) * 0.5;
        assert!((bbox_x - mover.position.x).abs() < 1e-5);
        // Not on the target, so the order stands
        assert_eq!(mover.state.move_target(), Some(Vec2::new(0.0, 0.05)));
    }

    #[test]
    fn test_pushed_off_target_keeps_moving() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        scene.spawn(Team::Player, Vec2::new(0.0, 1.0));
        scene.world.selection_mut().add(a);
        let target = Vec2::new(0.0, 0.05);
        scene.world.order_move(target);

        for _ in 0..3 {
            scene.step();
            let mover = scene.entity(a);
            assert!(mover.ground_position().length() < 1e-5);
            assert_eq!(mover.state, EntityState::Moving { target });
            assert_eq!(mover.anim.clip, mover.animations.moving);
        }
    }

    #[test]
    fn test_move_click_end_to_end() {
        let mut scene = Scene::new(2.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Ai, Vec2::new(0.0, 10.0));

        scene.click(pick(ClickKind::Select, Vec2::ZERO));
        scene.click(pick(ClickKind::Order, Vec2::new(0.0, 5.0)));
        assert_eq!(scene.entity(a).state.move_target(), Some(Vec2::new(0.0, 5.0)));

        // Two ticks already spent on the clicks; 5 units at 0.1 per tick
        let entity = scene.entity(a);
        let ticks = (5.0 / (entity.move_speed * DT)).ceil() as usize;
        for _ in 0..ticks {
            scene.step();
        }
        let entity = scene.entity(a);
        assert_eq!(entity.position, Vec3::new(0.0, 2.0, 5.0));
        assert!(!entity.state.is_moving());
        assert_eq!(scene.entity(b).ground_position(), Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_order_into_the_void_does_nothing() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        scene.world.selection_mut().add(a);
        scene.click(pick(ClickKind::Order, Vec2::new(500.0, 500.0)));
        assert_eq!(scene.entity(a).state, EntityState::Idle);
    }

    #[test]
    fn test_attack_end_to_end() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Ai, Vec2::new(0.0, 4.0));
        scene.world.selection_mut().add(a);

        scene.click(pick(ClickKind::OrderAttack, Vec2::new(0.0, 4.0)));
        let attacker = scene.entity(a);
        assert_eq!(attacker.state, EntityState::AttackResolving { target: b });
        assert_eq!(attacker.anim.clip, attacker.animations.attack);
        assert_eq!(attacker.anim.frame, 0);

        // Frame 0 is held for a tick, then the clip plays through
        let frames = attacker.animations.attack.frames as usize;
        for _ in 0..frames {
            scene.step();
        }
        assert_eq!(scene.entity(b).hit_points, 100.0);
        scene.step();

        let (attacker, victim) = (scene.entity(a), scene.entity(b));
        assert_eq!(victim.hit_points, 100.0 - attacker.attack_damage);
        assert!(!victim.state.is_dead());
        assert_eq!(
            attacker.state,
            EntityState::Attacking {
                target: b,
                phase: AttackPhase::CoolingDown
            }
        );
        assert_eq!(attacker.attack_cooldown, attacker.attack_cooldown_max);
    }

    #[test]
    fn test_cooldown_gates_next_swing() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Ai, Vec2::new(3.0, 0.0));
        scene.world.selection_mut().add(a);
        scene.world.order_attack(b);
        scene.world.get_mut(a).unwrap().attack_cooldown = 0.5;

        let mut ticks = 0;
        while !scene.entity(a).state.is_action() {
            scene.step();
            ticks += 1;
            assert!(ticks < 100, "never swung");
        }
        // 0.5 s of cooldown at 60 Hz, plus the tick that starts the swing
        assert!((30..=32).contains(&ticks), "swung after {ticks} ticks");
    }

    #[test]
    fn test_lethal_swing_kills_and_attacker_idles() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Ai, Vec2::new(0.0, 4.0));
        scene.world.get_mut(b).unwrap().hit_points = 25.0;
        scene.world.selection_mut().add(a);
        scene.world.order_attack(b);

        let swing = scene.entity(a).animations.attack.frames as usize + 2;
        for _ in 0..swing {
            scene.step();
        }
        let victim = scene.entity(b);
        assert_eq!(victim.state, EntityState::Dying);
        assert_eq!(victim.anim.clip, victim.animations.death);
        assert_eq!(victim.anim.frame, 0);
        let attacker = scene.entity(a);
        assert_eq!(attacker.state, EntityState::Idle);
        assert_eq!(attacker.anim.clip, attacker.animations.idle);

        // Death plays out and freezes on its last frame
        let death = victim.animations.death.frames;
        for _ in 0..death + 5 {
            scene.step();
        }
        let victim = scene.entity(b);
        assert_eq!(victim.state, EntityState::Dead);
        assert_eq!(victim.anim.frame, death - 1);

        // The dead ignore orders
        scene.world.selection_mut().select_only(b);
        assert_eq!(scene.world.order_move(Vec2::ONE), 0);
        assert_eq!(scene.world.order_attack(a), 0);
    }

    #[test]
    fn test_attacker_pursues_target_out_of_range() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Ai, Vec2::new(0.0, 20.0));
        scene.world.selection_mut().add(a);
        scene.world.order_attack(b);

        scene.step();
        let attacker = scene.entity(a);
        assert_eq!(
            attacker.state,
            EntityState::Attacking {
                target: b,
                phase: AttackPhase::Pursuing {
                    point: Vec2::new(0.0, 20.0)
                }
            }
        );
        assert!((attacker.position.z - attacker.move_speed * DT).abs() < 1e-6);

        // Target walks off; pursuit follows its live position
        scene.world.get_mut(b).unwrap().position.x = 6.0;
        scene.step();
        assert_eq!(
            scene.entity(a).state.move_target(),
            Some(Vec2::new(6.0, 20.0))
        );
    }

    #[test]
    fn test_attacker_in_range_but_cooling_stops() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Ai, Vec2::new(0.0, 3.0));
        scene.world.selection_mut().add(a);
        scene.world.order_attack(b);
        scene.world.get_mut(a).unwrap().attack_cooldown = 1.0;

        scene.step();
        let attacker = scene.entity(a);
        assert_eq!(
            attacker.state,
            EntityState::Attacking {
                target: b,
                phase: AttackPhase::CoolingDown
            }
        );
        assert_eq!(attacker.anim.clip, attacker.animations.idle);
        assert_eq!(attacker.ground_position(), Vec2::ZERO);
        assert!((attacker.attack_cooldown - (1.0 - DT)).abs() < 1e-6);
    }

    #[test]
    fn test_despawned_target_sends_attacker_idle() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let b = scene.spawn(Team::Ai, Vec2::new(0.0, 20.0));
        scene.world.selection_mut().add(a);
        scene.world.order_attack(b);
        scene.step();

        scene.world.despawn(b);
        scene.step();
        assert_eq!(scene.entity(a).state, EntityState::Idle);
    }

    #[test]
    fn test_empty_entities_are_inert() {
        let mut scene = Scene::new(0.0);
        let mut spawn = UnitTemplate::default().spawn(Team::Player, Vec2::ZERO);
        spawn.kind = EntityKind::Empty;
        let marker = scene.world.spawn(&spawn);
        scene.world.get_mut(marker).unwrap().state = EntityState::Moving { target: Vec2::X };

        scene.step();
        let entity = scene.entity(marker);
        assert_eq!(entity.ground_position(), Vec2::ZERO);
        assert_eq!(entity.anim.frame, 0);
    }

    #[test]
    fn test_idle_animation_loops() {
        let mut scene = Scene::new(0.0);
        let a = scene.spawn(Team::Player, Vec2::ZERO);
        let frames = scene.entity(a).animations.idle.frames;
        // One held tick, then a full loop back to frame 0
        for _ in 0..=frames {
            scene.step();
        }
        assert_eq!(scene.entity(a).anim.frame, 0);
        scene.step();
        assert_eq!(scene.entity(a).anim.frame, 1);
        assert_eq!(scene.world.time_ticks, u64::from(frames) + 2);
    }
}
