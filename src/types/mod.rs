pub mod alert;
pub mod engine;
pub mod events;
pub mod pool;
pub mod proxy;
pub mod sniper_config;
