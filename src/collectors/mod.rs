pub mod heartbeat_collector;
pub mod pool_created_collector;
