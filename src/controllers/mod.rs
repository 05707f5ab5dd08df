pub mod home_controller;
pub mod watches_controller;
pub mod monitor_controller;
