pub mod csv_records;
pub mod normalize;
