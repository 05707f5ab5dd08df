pub mod watch;
pub mod price_sample;
pub mod quote;
pub mod stats;

pub use watch::{Direction, NewWatch, Watch, WatchId};
pub use price_sample::PriceSample;
pub use quote::Quote;
pub use stats::Statistics;
