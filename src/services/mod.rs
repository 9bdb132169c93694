pub mod broadcast_service;
pub mod menu_service;
pub mod stream_service;
