//! Command implementations that do more than call the graph service.

pub mod init;
