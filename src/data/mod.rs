/// Data layer: core types, loading, caching, and filtering.
///
/// Architecture:
/// ```text
///  .xlsx / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → DealRecord rows
///   └──────────┘
///        │ (cached per path in `cache`)
///        ▼
///   ┌──────────────┐
///   │ DealDataset   │  records + buyer-expanded rows
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date/value predicates → filtered indices
///   └──────────┘
/// ```
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
