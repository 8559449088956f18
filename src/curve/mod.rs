pub mod instructions;
pub mod math;
pub mod planner;
