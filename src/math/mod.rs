pub mod mann_kendall;
pub mod stats;
