pub mod devices;
pub mod state;
pub mod values;
