pub mod barcode;
pub mod collision;
pub mod deferred;
pub mod graph;
pub mod mapping;
pub mod pair;
pub mod propagate;
pub mod run;
pub mod sample_type;
pub mod slot;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;
