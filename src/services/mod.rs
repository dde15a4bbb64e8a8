pub mod checklist;
pub mod diet_plan;
pub mod merge;
pub mod scoring;
