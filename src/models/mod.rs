pub mod courier;
pub mod order;
pub mod status;
