pub mod detector;
pub mod evidence;
pub mod service;
