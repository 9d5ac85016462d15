//! Player actor and simulated key state
//!
//! The replayer drives anything implementing [`Actor`]. [`Player`] is the
//! demo's own top-down body: acceleration toward a wish direction, speed
//! capped by walk/sprint speed, and proportional friction.

use glam::DVec2;

use crate::config::PhysicsConfig;

/// Keys read by the movement model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    S,
    A,
    D,
    LeftShift,
    RightShift,
}

impl Key {
    pub const ALL: [Key; 6] = [
        Key::W,
        Key::S,
        Key::A,
        Key::D,
        Key::LeftShift,
        Key::RightShift,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Down-state for every [`Key`], as polled from a keyboard or rebuilt
/// from a replay log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedKeys {
    down: [bool; Key::ALL.len()],
}

impl SimulatedKeys {
    /// All keys released
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys held down from a list
    pub fn pressed(keys: &[Key]) -> Self {
        let mut state = Self::new();
        for &key in keys {
            state.set(key, true);
        }
        state
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }

    pub fn set(&mut self, key: Key, down: bool) {
        self.down[key.index()] = down;
    }

    /// Either shift key is down
    pub fn shift(&self) -> bool {
        self.is_down(Key::LeftShift) || self.is_down(Key::RightShift)
    }

    /// Set both shift keys at once
    pub fn set_shift(&mut self, down: bool) {
        self.set(Key::LeftShift, down);
        self.set(Key::RightShift, down);
    }

    pub fn release_all(&mut self) {
        self.down = [false; Key::ALL.len()];
    }
}

/// Collaborator contract between the replayer and the simulated body.
///
/// Only the playback engine mutates an actor during playback; renderers
/// read it.
pub trait Actor {
    fn position(&self) -> DVec2;
    fn velocity(&self) -> DVec2;
    fn is_sprinting(&self) -> bool;

    /// Whether the adrenaline boost is currently active
    fn adrenaline_active(&self) -> bool {
        false
    }

    fn set_position(&mut self, position: DVec2);
    fn set_velocity(&mut self, velocity: DVec2);
    fn set_sprinting(&mut self, sprinting: bool);
    fn set_adrenaline_active(&mut self, _active: bool) {}

    /// Advance the body by `dt` seconds with the given keys held.
    fn update(&mut self, keys: &SimulatedKeys, dt: f64);
}

/// The demo's player body.
#[derive(Debug, Clone)]
pub struct Player {
    pub position: DVec2,
    pub velocity: DVec2,
    pub sprinting: bool,
    pub adrenaline: bool,
    /// Lagging position used for smooth drawing
    pub render_position: DVec2,
    physics: PhysicsConfig,
}

impl Default for Player {
    fn default() -> Self {
        Self::centered(PhysicsConfig::default(), 1920.0, 1080.0)
    }
}

impl Player {
    /// Create a player at rest at `spawn`
    pub fn new(physics: PhysicsConfig, spawn: DVec2) -> Self {
        Self {
            position: spawn,
            velocity: DVec2::ZERO,
            sprinting: false,
            adrenaline: false,
            render_position: spawn,
            physics,
        }
    }

    /// Create a player at rest in the middle of a `width` x `height` screen
    pub fn centered(physics: PhysicsConfig, width: f64, height: f64) -> Self {
        Self::new(physics, DVec2::new(width / 2.0, height / 2.0))
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Keep the whole body inside a `width` x `height` screen.
    pub fn clamp_to_bounds(&mut self, width: f64, height: f64) {
        let half = self.physics.player_size / 2.0;
        self.position.x = self.position.x.min(width - half).max(half);
        self.position.y = self.position.y.min(height - half).max(half);
    }

    fn wish_direction(keys: &SimulatedKeys) -> DVec2 {
        let mut wish = DVec2::ZERO;
        if keys.is_down(Key::W) {
            wish.y -= 1.0;
        }
        if keys.is_down(Key::S) {
            wish.y += 1.0;
        }
        if keys.is_down(Key::A) {
            wish.x -= 1.0;
        }
        if keys.is_down(Key::D) {
            wish.x += 1.0;
        }

        let length = wish.length();
        if length > 0.001 { wish / length } else { wish }
    }
}

impl Actor for Player {
    fn position(&self) -> DVec2 {
        self.position
    }

    fn velocity(&self) -> DVec2 {
        self.velocity
    }

    fn is_sprinting(&self) -> bool {
        self.sprinting
    }

    fn adrenaline_active(&self) -> bool {
        self.adrenaline
    }

    fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
    }

    fn set_sprinting(&mut self, sprinting: bool) {
        self.sprinting = sprinting;
    }

    fn set_adrenaline_active(&mut self, active: bool) {
        self.adrenaline = active;
    }

    fn update(&mut self, keys: &SimulatedKeys, dt: f64) {
        self.sprinting = keys.shift();
        let max_speed = if self.sprinting {
            self.physics.sprint_speed
        } else {
            self.physics.walk_speed
        };

        let wish = Self::wish_direction(keys);
        let current_speed = self.velocity.dot(wish);
        let add_speed = max_speed - current_speed;
        if add_speed > 0.0 {
            let accel_speed = (self.physics.acceleration * max_speed * dt).min(add_speed);
            self.velocity += wish * accel_speed;
        }

        let speed = self.velocity.length();
        if speed > 0.001 {
            let drop = speed * self.physics.friction * dt;
            let new_speed = (speed - drop).max(0.0);
            self.velocity *= new_speed / speed;
        } else {
            self.velocity = DVec2::ZERO;
        }

        self.position += self.velocity * dt;
        self.render_position += (self.position - self.render_position) * 0.5;
    }
}
