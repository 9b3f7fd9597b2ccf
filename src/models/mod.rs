pub mod batch;
pub mod campaign;
pub mod item;
pub mod job;
