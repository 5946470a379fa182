pub const ENGINE_MESSAGE_CHANNEL_CAPACITY: usize = 512;

/// How many creation-event pools are kept for merging into ranking batches.
pub const RECENT_POOLS_CAPACITY: usize = 256;

/// Per-owner dedup of already-alerted pools across discovery cycles.
pub const SEEN_POOLS_CAPACITY: usize = 4096;

/// Seconds a proxy swap stays valid after the matching pool was evaluated.
pub const TRADE_DEADLINE_S: u64 = 300;
