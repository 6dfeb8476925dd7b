pub mod default;
pub mod items;
pub mod process;
