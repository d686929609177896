mod event;
mod window;

#[cfg(test)]
mod tests;

pub use event::*;
pub use window::*;
