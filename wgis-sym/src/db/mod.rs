//! Database access for wgis-sym

pub mod layers;
pub mod symbology;

pub use layers::{get_layer, register_layer, LayerRecord};
pub use symbology::{SqliteSymbologyStore, SymbologyStore};
