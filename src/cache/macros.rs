/// A macro to simplify read-through caching against a [`QueryCache`](crate::cache::QueryCache).
///
/// Checks the cache for the fingerprint. On a hit the cached value is returned
/// as-is. On a miss the block is awaited; if it succeeds its value is stored
/// under the fingerprint before being returned, and if it fails the error is
/// propagated and nothing is stored.
///
/// # Arguments
/// * `$cache`: The cache instance. Must expose async `get` and `put`.
/// * `$key`: The [`Fingerprint`](crate::cache::Fingerprint) to look up and store under.
/// * `$block`: A future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let result = cached!(self.cache, fingerprint, async move {
///     self.generate_uncached(&query).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        if let Some(cached) = $cache.get(&$key).await {
            tracing::info!(fingerprint = %$key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(fingerprint = %$key, "Cache miss");
            match $block.await {
                Ok(value) => {
                    $cache.put($key.clone(), ::core::clone::Clone::clone(&value)).await;
                    Ok(value)
                }
                Err(e) => Err(e),
            }
        }
    }};
}
