use crate::types::pool::Pool;
use crate::types::sniper_config::SniperConfig;

/// Pure criteria filter: no I/O, no clock, no chain. Predicates run in a
/// fixed order and short-circuit on the first failure, so a pool on the
/// wrong chain is rejected before any of its other fields are even looked
/// at. Comparisons are written so malformed numerics (NaN) fail the
/// predicate instead of panicking.
pub fn matches_criteria(pool: &Pool, config: &SniperConfig) -> bool {
    let token = pool.base_token.address.to_lowercase();

    // 1. chain
    if !config
        .target_chains
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&pool.chain))
    {
        return false;
    }
    // 2. exchange
    if !config
        .target_dexs
        .iter()
        .any(|d| d.eq_ignore_ascii_case(&pool.exchange))
    {
        return false;
    }
    // 3. liquidity floor
    if !(pool.liquidity_usd >= config.min_liquidity) {
        return false;
    }
    // 4. market-cap band
    if !(pool.market_cap_usd >= config.min_market_cap
        && pool.market_cap_usd <= config.max_market_cap)
    {
        return false;
    }
    // 5. tax ceilings
    if !(pool.buy_tax_pct <= config.max_buy_tax && pool.sell_tax_pct <= config.max_sell_tax) {
        return false;
    }
    // 6. honeypot verdict
    if config.honeypot_check && pool.is_honeypot {
        return false;
    }
    // 7. liquidity lock
    if config.lock_check && !pool.lock.is_locked {
        return false;
    }
    // 8. blacklist
    if config
        .blacklist
        .iter()
        .any(|b| b.eq_ignore_ascii_case(&token))
    {
        return false;
    }
    // 9. whitelist (only when non-empty)
    if !config.whitelist.is_empty()
        && !config
            .whitelist
            .iter()
            .any(|w| w.eq_ignore_ascii_case(&token))
    {
        return false;
    }

    true
}
