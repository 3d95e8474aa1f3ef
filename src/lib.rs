pub mod canvas;
pub mod cursor;
pub mod param;
pub mod scene;
pub mod shape;
pub mod tree;

// Script hosting modules
pub mod script_api;
pub mod script_diagnostics;
pub mod script_log;
pub mod scripting;

pub mod cli;
