pub mod medical_image;
pub mod patient;

pub use medical_image::*;
pub use patient::*;
