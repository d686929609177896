pub mod store;
pub mod tracing;

pub use store::TestStore;
pub use tracing::{CapturedEvent, init_test_tracing};
