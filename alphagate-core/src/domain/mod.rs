//! Domain types shared across the engine.

pub mod bar;
pub mod order;
pub mod record;
pub mod regime;

pub use bar::Bar;
pub use order::Order;
pub use record::FssRecord;
pub use regime::MarketRegime;
