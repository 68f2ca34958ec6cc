/// Data layer: core types, loading, and range filtering.
///
/// Architecture:
/// ```text
///  workbook .json / uploaded .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse rows, coerce timestamps → LoadReport
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ TimeSeries  │  Vec<Record> in source order
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  inclusive [start, end] date window → new TimeSeries
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
