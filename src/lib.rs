//! bankseg: Rule-based customer segmentation, financial health scoring and population
//! analytics for retail banking, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
