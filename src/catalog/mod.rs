pub mod loader;
pub mod schema;
pub mod validate;

pub use loader::{load_catalog, resolve_catalog};
pub use schema::{
    Catalog, CustomParameter, EvcCost, Module, ParameterEffect, PaymentOption,
    ProductionCapacityTier, ResourceAllocationStrategy, Variant, VariantId, VariantParseError,
    VolumeDiscount,
};
pub use validate::{validate_catalog, CatalogError};
