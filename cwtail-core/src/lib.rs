pub mod backend;
pub mod cli;
pub mod conf;
pub mod list;
pub mod logging;
pub mod model;
pub mod tail;
