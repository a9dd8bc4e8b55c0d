pub mod cli;
pub mod config;
pub mod ctx;
pub mod error;
pub mod input;
pub mod io;
pub mod lesion;
pub mod mapping;
pub mod pipeline;
pub mod rng;
pub mod rules;
pub mod volume;
pub mod zones;

pub mod math {
    pub mod stats;
}

pub mod schema {
    pub mod v1;
}
