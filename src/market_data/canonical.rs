use std::cmp::Ordering;
use std::collections::HashSet;

use crate::types::pool::{Pool, RankedPools, RankingParams, SortBy, SortOrder};

/// Drop duplicate base-token addresses (case-insensitive); the first
/// occurrence wins, so callers control precedence by input order.
pub fn dedup_pools(pools: Vec<Pool>) -> Vec<Pool> {
    let mut seen = HashSet::new();
    pools
        .into_iter()
        .filter(|pool| seen.insert(pool.dedup_key()))
        .collect()
}

fn compare(a: &Pool, b: &Pool, sort_by: SortBy) -> Ordering {
    // total_cmp keeps the comparator total even when a provider leaks a NaN
    match sort_by {
        SortBy::MarketCap => a.market_cap_usd.total_cmp(&b.market_cap_usd),
        SortBy::Volume => a.volume_usd.total_cmp(&b.volume_usd),
        SortBy::HolderCount => a.holder_count.cmp(&b.holder_count),
        SortBy::CreatedAt => a.created_at_unix.cmp(&b.created_at_unix),
    }
}

/// Dedup, stable-sort, and paginate one batch into the page collaborators
/// get. Stateless: safe to call concurrently from the discovery loop and the
/// event subscription.
pub fn rank_pools(pools: Vec<Pool>, params: &RankingParams) -> RankedPools {
    let mut pools = dedup_pools(pools);

    // Vec::sort_by is stable, so ties keep their input order
    pools.sort_by(|a, b| {
        let ordering = compare(a, b, params.sort_by);
        match params.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let total = pools.len();
    let page = params.page.max(1);
    let limit = params.limit;
    let start = (page - 1).saturating_mul(limit);
    let end = page.saturating_mul(limit).min(total);
    let page_slice = if start >= total {
        Vec::new()
    } else {
        pools[start..end].to_vec()
    };

    RankedPools {
        pools: page_slice,
        total,
        page,
        limit,
        has_more: page * limit < total,
    }
}
