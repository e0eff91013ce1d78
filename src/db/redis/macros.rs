/// Read-through caching around a catalog fetch.
///
/// `$cache` is an `Option<&Cache>`. With no cache the block simply runs. On a hit
/// the cached value is returned; on a miss the block runs and its successful
/// result is queued for writing with `$ttl` seconds to live. A failing cache read
/// is logged and treated as a miss, so Redis trouble never fails a catalog call.
///
/// # Example
/// ```rust,ignore
/// let works: Vec<AuthorWork> = cached!(self.cache.as_ref(), key, ttl, async move {
///     self.fetch_author_works(author_key, limit).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache {
            Some(cache) => {
                let key = $key;
                let hit = match cache.get_from_cache(&key).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::warn!(error = %e, key = %key, "Cache read failed, fetching directly");
                        None
                    }
                };
                match hit {
                    Some(cached) => Ok(cached),
                    None => match $block.await {
                        Ok(value) => {
                            cache.set_in_background(&key, &value, $ttl);
                            Ok(value)
                        }
                        Err(e) => Err(e),
                    },
                }
            }
            None => $block.await,
        }
    }};
}
