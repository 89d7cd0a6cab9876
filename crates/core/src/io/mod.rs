//! Reading and writing rasters
//!
//! Only GeoTIFF with ModelPixelScale/ModelTiepoint georeferencing is
//! supported; it is what DEM providers ship and what the CLI writes back.

mod geotiff;

pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
