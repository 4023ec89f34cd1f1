pub mod adapters;
pub mod config;
pub mod domain;
pub mod seed;
pub mod services;
pub mod storage;

#[cfg(test)]
mod tests;
