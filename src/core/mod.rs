pub mod planner;

pub use planner::OutingPlanner;
