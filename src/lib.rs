pub mod background;
pub mod cli;
pub mod ctx;
pub mod engine;
pub mod error;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod rules;
pub mod schema;
pub mod scores;
