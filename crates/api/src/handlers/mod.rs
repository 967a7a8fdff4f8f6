pub mod catalog;
pub mod climate;
pub mod params;
pub mod qa;
pub mod velocity;
