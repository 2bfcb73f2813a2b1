pub mod descent;
pub mod direction;
pub mod matrix;
pub mod region;
pub mod region_cost;
pub mod seed;
pub mod summed_area_table;
pub mod utils;
