use engine_core::{Transform, Vec3, Velocity};

/// Pose and velocity of a ship body at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipKinematics {
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl ShipKinematics {
    pub fn new(transform: Transform, velocity: Velocity) -> Self {
        Self {
            transform,
            linear_velocity: velocity.linear,
            angular_velocity: velocity.angular,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    pub fn right(&self) -> Vec3 {
        self.transform.right()
    }

    pub fn up(&self) -> Vec3 {
        self.transform.up()
    }

    pub fn speed(&self) -> f32 {
        self.linear_velocity.length()
    }

    pub fn velocity(&self) -> Velocity {
        Velocity::with_angular(self.linear_velocity, self.angular_velocity)
    }
}
