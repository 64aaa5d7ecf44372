pub mod cli;
pub mod colony;
pub mod config;
pub mod persistence;
pub mod simulation;
pub mod world;
