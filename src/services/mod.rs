pub mod ride_store;
