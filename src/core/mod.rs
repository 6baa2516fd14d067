pub mod adapter;
pub mod bulk;
pub mod catalog;
pub mod file_store;
pub mod formats;
pub mod gps;
pub mod metadata;
pub mod store;
pub mod xmp_packet;
