//! Endpoint kinematics consumed by the delay models.
//!
//! The simulator owns node movement; delay models only read a snapshot through
//! the [`Mobility`] trait at the instant of the query.

use crate::propagation::geometry::Vector3;

/// Read-only view of an endpoint's kinematic state.
pub trait Mobility {
    /// Current position in meters.
    fn position(&self) -> Vector3;
    /// Current velocity in m/s.
    fn velocity(&self) -> Vector3;
    /// Stable simulator-assigned node id, if the endpoint is attached to a node.
    fn node_id(&self) -> Option<u32>;
}

/// Plain snapshot of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MobilityState {
    pub position: Vector3,
    pub velocity: Vector3,
    pub node_id: Option<u32>,
}

impl MobilityState {
    /// Snapshot of a node-attached endpoint.
    pub fn new(node_id: u32, position: Vector3, velocity: Vector3) -> Self {
        Self {
            position,
            velocity,
            node_id: Some(node_id),
        }
    }

    /// Snapshot that is not linked to any node.
    pub fn detached(position: Vector3, velocity: Vector3) -> Self {
        Self {
            position,
            velocity,
            node_id: None,
        }
    }

    /// Stationary node-attached endpoint.
    pub fn at(node_id: u32, position: Vector3) -> Self {
        Self::new(node_id, position, Vector3::ZERO)
    }
}

impl Mobility for MobilityState {
    fn position(&self) -> Vector3 {
        self.position
    }

    fn velocity(&self) -> Vector3 {
        self.velocity
    }

    fn node_id(&self) -> Option<u32> {
        self.node_id
    }
}

/// Axis-aligned bounds in the horizontal plane (meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn square(side: f64) -> Self {
        Self {
            min_x: 0.0,
            max_x: side,
            min_y: 0.0,
            max_y: side,
        }
    }

    pub fn contains(&self, p: &Vector3) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Constant-velocity walker that reflects off the bounds.
#[derive(Debug, Clone)]
pub struct ConstantVelocityMobility {
    state: MobilityState,
    bounds: Bounds,
}

impl ConstantVelocityMobility {
    pub fn new(node_id: u32, position: Vector3, velocity: Vector3, bounds: Bounds) -> Self {
        Self {
            state: MobilityState::new(node_id, position, velocity),
            bounds,
        }
    }

    /// Advance the walker by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        let mut next = self.state.position + self.state.velocity * dt;
        let mut velocity = self.state.velocity;

        (next.x, velocity.x) = reflect(next.x, velocity.x, self.bounds.min_x, self.bounds.max_x);
        (next.y, velocity.y) = reflect(next.y, velocity.y, self.bounds.min_y, self.bounds.max_y);

        self.state.position = next;
        self.state.velocity = velocity;
    }

    pub fn state(&self) -> MobilityState {
        self.state
    }
}

impl Mobility for ConstantVelocityMobility {
    fn position(&self) -> Vector3 {
        self.state.position
    }

    fn velocity(&self) -> Vector3 {
        self.state.velocity
    }

    fn node_id(&self) -> Option<u32> {
        self.state.node_id
    }
}

/// Fold a coordinate back into `[min, max]`, flipping the velocity component
/// on every bounce.
fn reflect(mut value: f64, mut velocity: f64, min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    if span <= 0.0 {
        return (min, 0.0);
    }
    while value < min || value > max {
        if value < min {
            value = 2.0 * min - value;
        } else {
            value = 2.0 * max - value;
        }
        velocity = -velocity;
    }
    (value, velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn snapshot_exposes_identity() {
        let s = MobilityState::at(7, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(s.node_id(), Some(7));
        assert_eq!(s.velocity(), Vector3::ZERO);
        assert_eq!(MobilityState::detached(Vector3::ZERO, Vector3::ZERO).node_id(), None);
    }

    #[test]
    fn walker_moves_in_straight_line() {
        let mut m = ConstantVelocityMobility::new(1, Vector3::new(10.0, 10.0, 1.5), Vector3::new(2.0, 1.0, 0.0), Bounds::square(100.0));
        m.advance(2.0);
        assert_eq!(m.position(), Vector3::new(14.0, 12.0, 1.5));
        assert_eq!(m.node_id(), Some(1));
    }

    #[test]
    fn walker_bounces_off_bounds() {
        let mut m = ConstantVelocityMobility::new(1, Vector3::new(98.0, 50.0, 0.0), Vector3::new(5.0, 0.0, 0.0), Bounds::square(100.0));
        m.advance(1.0);
        assert_approx_eq!(m.position().x, 97.0);
        assert_approx_eq!(m.velocity().x, -5.0);
        assert!(Bounds::square(100.0).contains(&m.position()));
    }

    #[test]
    fn walker_stays_inside_after_many_steps() {
        let bounds = Bounds::square(10.0);
        let mut m = ConstantVelocityMobility::new(3, Vector3::new(1.0, 9.0, 0.0), Vector3::new(-7.3, 4.9, 0.0), bounds);
        for _ in 0..1000 {
            m.advance(0.37);
            assert!(bounds.contains(&m.position()));
        }
    }
}
