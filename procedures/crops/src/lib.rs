pub mod catalog;
pub mod growth;
pub mod plugin;

pub use catalog::{CropCatalog, CropKind};
pub use growth::{CropGrowth, GrowthError, GrowthEvent, GrowthStages};
pub use plugin::{grow_crops, plant_crops, CropMatured, CropsPlugin};
