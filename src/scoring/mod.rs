pub mod aggregator;
pub mod classifier;
pub mod insights;

pub use aggregator::*;
pub use classifier::*;
pub use insights::{Insights, style_description};
