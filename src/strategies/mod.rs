pub mod logger_interceptor;
pub mod matcher;
pub mod sniper_strategy;

pub use logger_interceptor::LoggerInterceptorStrategy;
pub use sniper_strategy::SniperStrategy;
