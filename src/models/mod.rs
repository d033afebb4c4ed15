pub mod organization;
pub mod plan;
