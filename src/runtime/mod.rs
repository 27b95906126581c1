mod follower;

pub use follower::*;
