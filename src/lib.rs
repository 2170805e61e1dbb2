//! Packwise
//!
//! Packwise chooses which product categories to ship, how many boxes of each and how much
//! declared weight each carries, so that a shipment of fixed total weight and box count pays
//! the least duty in the destination market while its declared value stays above a floor.
//!
//! The selection is solved as a mixed-integer linear program. Requests carry their products
//! inline or fall back to a [`catalog::CatalogSource`].

pub mod catalog;
pub mod fixtures;
pub mod prelude;
pub mod products;
pub mod request;
pub mod results;
pub mod service;
pub mod solvers;
