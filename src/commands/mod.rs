pub mod measure;
pub mod run;
pub mod shuffle;
pub mod snapshot;
pub mod spacing;
pub mod utils;
pub mod version;

#[cfg(test)]
#[path = "../commands_test.rs"]
mod commands_test;
