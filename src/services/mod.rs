pub mod gallery_service;
pub mod permission_service;

pub use gallery_service::*;
pub use permission_service::*;
