pub mod aerodynamics;
pub mod body;
pub mod host;
pub mod kinematics;
pub mod orbit;
pub mod vehicle;
