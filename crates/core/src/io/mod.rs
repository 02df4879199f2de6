//! Reading and writing geospatial data

mod geojson;
mod geotiff;

pub use geojson::{read_geojson, read_geojson_from_str};
pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
