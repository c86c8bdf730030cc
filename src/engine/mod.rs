pub mod facade;
pub mod lifecycle;
pub mod motion;
pub mod orders;
