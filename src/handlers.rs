pub mod auth;
pub mod companies;
pub mod health;
pub mod important_dates;
pub mod placement_progress;
pub mod stage_progress;
pub mod stages;
pub mod students;
