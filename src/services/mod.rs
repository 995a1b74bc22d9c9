pub mod fuel_stations;
pub mod geoapify;
