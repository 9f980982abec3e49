//! Entity state machine
//!
//! ```text
//!            move order                    arrive
//!   Idle ─────────────────▶ Moving ───────────────────▶ Idle
//!     │                                                  ▲
//!     │ attack order                        target dies  │
//!     ▼                                                  │
//!   Attacking{Pursuing} ◀──▶ Attacking{CoolingDown} ─────┤
//!     │        in range + ready  │                        │
//!     └──────────────┬───────────┘                        │
//!                    ▼          swing done                │
//!             AttackResolving ────────▶ Attacking / Idle ─┘
//!
//!   any ── hit points <= 0 ──▶ Dying ── clip done ──▶ Dead
//! ```

use glam::Vec2;

use super::entity::Entity;
use super::world::EntityId;

/// What an attacker is doing between swings
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackPhase {
    /// Out of range, closing on the target's last known position
    Pursuing { point: Vec2 },
    /// In range, standing still until the cooldown runs out
    CoolingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EntityState {
    #[default]
    Idle,
    Moving {
        target: Vec2,
    },
    Attacking {
        target: EntityId,
        phase: AttackPhase,
    },
    /// Mid-swing; damage lands when the attack clip finishes
    AttackResolving {
        target: EntityId,
    },
    /// Playing the death clip
    Dying,
    /// Frozen on the last death frame for good
    Dead,
}

/// An order issued to a selected entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Order {
    Move(Vec2),
    Attack(EntityId),
}

impl EntityState {
    /// Translating along the ground this tick
    pub fn is_moving(&self) -> bool {
        matches!(
            self,
            EntityState::Moving { .. }
                | EntityState::Attacking {
                    phase: AttackPhase::Pursuing { .. },
                    ..
                }
        )
    }

    pub fn is_attacking(&self) -> bool {
        matches!(
            self,
            EntityState::Attacking { .. } | EntityState::AttackResolving { .. }
        )
    }

    /// Playing a one-shot clip that blocks ordinary transitions
    pub fn is_action(&self) -> bool {
        matches!(self, EntityState::AttackResolving { .. } | EntityState::Dying)
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, EntityState::Dying | EntityState::Dead)
    }

    /// Entity the state is aimed at, if any
    pub fn target_entity(&self) -> Option<EntityId> {
        match *self {
            EntityState::Attacking { target, .. } | EntityState::AttackResolving { target } => {
                Some(target)
            }
            _ => None,
        }
    }

    /// Ground point the entity is walking to, if any
    pub fn move_target(&self) -> Option<Vec2> {
        match *self {
            EntityState::Moving { target } => Some(target),
            EntityState::Attacking {
                phase: AttackPhase::Pursuing { point },
                ..
            } => Some(point),
            _ => None,
        }
    }

    /// Leave the walking part of the state: Moving becomes Idle, pursuit
    /// becomes cooling down in place
    pub fn stop_moving(self) -> Self {
        match self {
            EntityState::Moving { .. } => EntityState::Idle,
            EntityState::Attacking {
                target,
                phase: AttackPhase::Pursuing { .. },
            } => EntityState::Attacking {
                target,
                phase: AttackPhase::CoolingDown,
            },
            other => other,
        }
    }
}

/// Transitions
impl Entity {
    /// Hand an order to this entity
    ///
    /// Dying and dead entities ignore orders. Mid-swing the order waits until
    /// the swing resolves. Returns whether the order was accepted.
    pub fn command(&mut self, order: Order) -> bool {
        match self.state {
            EntityState::Dying | EntityState::Dead => false,
            EntityState::AttackResolving { .. } => {
                self.pending_order = Some(order);
                true
            }
            _ => {
                self.apply_order(order);
                true
            }
        }
    }

    fn apply_order(&mut self, order: Order) {
        self.state = match order {
            Order::Move(target) => EntityState::Moving { target },
            Order::Attack(target) => EntityState::Attacking {
                target,
                phase: AttackPhase::Pursuing {
                    point: self.ground_position(),
                },
            },
        };
        self.anim.ensure(self.animations.moving);
    }

    /// In range and off cooldown: start the swing
    pub(crate) fn begin_swing(&mut self, target: EntityId) {
        self.state = EntityState::AttackResolving { target };
        self.anim.play(self.animations.attack);
    }

    /// Swing clip finished: restart the cooldown and go back to attacking,
    /// or to idle if the target did not survive. A held order wins over both.
    pub(crate) fn finish_swing(&mut self, target: EntityId, target_alive: bool) {
        self.attack_cooldown = self.attack_cooldown_max;
        self.state = if target_alive {
            EntityState::Attacking {
                target,
                phase: AttackPhase::CoolingDown,
            }
        } else {
            EntityState::Idle
        };
        self.anim.play(self.animations.idle);
        if let Some(order) = self.pending_order.take() {
            self.apply_order(order);
        }
    }

    /// Drop whatever the entity was doing and stand idle
    pub(crate) fn stand_down(&mut self) {
        self.state = EntityState::Idle;
        self.pending_order = None;
        self.anim.play(self.animations.idle);
    }

    /// Apply damage; returns true if this blow killed the entity
    pub(crate) fn take_damage(&mut self, damage: f32) -> bool {
        if self.state.is_dead() {
            return false;
        }
        self.hit_points -= damage;
        if self.hit_points <= 0.0 {
            self.state = EntityState::Dying;
            self.pending_order = None;
            self.anim.play(self.animations.death);
            return true;
        }
        false
    }
}
