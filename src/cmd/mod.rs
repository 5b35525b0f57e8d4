pub mod init;
pub mod month;
pub mod parse;
pub mod presets;
pub mod root;
