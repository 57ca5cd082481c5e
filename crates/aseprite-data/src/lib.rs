pub mod model;

pub use model::SheetJson;
