pub mod behavior;
pub mod command;
pub mod launch;
pub mod policy;
pub mod vessel;
