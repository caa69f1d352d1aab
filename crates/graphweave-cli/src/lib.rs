//! Library half of the `gw` binary, split out so commands can be tested.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
