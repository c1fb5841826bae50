/// A macro to simplify fail-open caching around a `ResponseCache`.
///
/// Returns the fresh cached value if present. Otherwise awaits `$block`,
/// stores the result under `$key` for `$ttl`, and returns it. If `$block`
/// fails and an expired record exists, the stale value is returned.
///
/// # Example
/// ```rust,ignore
/// let titles = cached!(self.cache, CacheKey::search(query), ttl::SEARCH, async move {
///     fetch_titles(query).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        $cache.get_or_fetch(&$key, $ttl, || $block).await
    }};
}
