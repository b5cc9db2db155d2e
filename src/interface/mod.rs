pub mod helper;
pub mod setting;
