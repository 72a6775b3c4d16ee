mod joint;
mod pin;
mod distance;

pub use self::joint::Joint;
pub use self::pin::PinJoint;
pub use self::distance::DistanceJoint;
