pub mod backend;
pub mod driver_location;
pub mod maps;
pub mod orders;
pub mod status;
pub mod weather;

pub use backend::BackendClient;
pub use driver_location::process_driver_location;
pub use maps::{process_maps_script_url, process_maps_service};
pub use orders::process_track_order;
pub use status::process_status;
pub use weather::process_weather;
