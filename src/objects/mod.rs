pub mod driver_status;
