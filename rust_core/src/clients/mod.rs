pub mod nhl;

pub use nhl::NhlClient;
