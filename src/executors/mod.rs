pub mod command;
pub mod runner;
pub mod toolchain;
