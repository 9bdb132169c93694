pub mod menu_routes;
pub mod system_routes;
