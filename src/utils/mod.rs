//! Process bootstrap helpers shared by the binary and the storage layer.

pub mod bootstrap;
