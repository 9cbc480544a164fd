//! Per-client memo of read results.
//!
//! Entries live as long as the owning client. There is no eviction, no expiry and no
//! invalidation on writes: placing an order does not refresh a cached order book. A
//! read issued with caching disabled still stores its fresh result, so later cached
//! reads observe it.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// Operation name plus the form encoding of its parameters, e.g.
/// `mytrades?marketid=1&limit=200`.
///
/// Parameters are encoded in declaration order with `=` and `&` delimiters, so two
/// calls share a key only when every parameter value matches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey(String);

impl CacheKey {
    pub(crate) fn new<P: Serialize + ?Sized>(method: &str, params: &P) -> Result<Self> {
        let encoded = serde_html_form::to_string(params)?;
        if encoded.is_empty() {
            Ok(Self(method.to_owned()))
        } else {
            Ok(Self(format!("{method}?{encoded}")))
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ResultCache {
    entries: HashMap<CacheKey, Value>,
}

impl ResultCache {
    /// Returns the entry for `key`, calling `fetch` and storing its result first when
    /// `cached` is off or nothing is stored yet. A failed fetch leaves the map untouched.
    pub(crate) fn get_or_refresh<F>(
        &mut self,
        key: CacheKey,
        cached: bool,
        fetch: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Result<Value>,
    {
        if cached {
            if let Some(value) = self.entries.get(&key) {
                #[cfg(feature = "tracing")]
                tracing::trace!(key = %key.0, "cache hit");

                return Ok(value.clone());
            }
        }

        let value = fetch()?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::api::types::{MarketId, MarketParams, MyTradesParams};
    use crate::error::Error;

    fn key(method: &str) -> CacheKey {
        CacheKey::new(method, &()).expect("key")
    }

    #[test]
    fn parameterless_key_should_be_method_name() {
        assert_eq!(key("getinfo"), CacheKey("getinfo".to_owned()));
    }

    #[test]
    fn keys_should_differ_per_parameter_value() -> Result<()> {
        let three = MarketId::from(3_u64);
        let four = MarketId::from(4_u64);

        let a = CacheKey::new("depth", &MarketParams { marketid: &three })?;
        let b = CacheKey::new("depth", &MarketParams { marketid: &four })?;
        let c = CacheKey::new("marketorders", &MarketParams { marketid: &three })?;

        assert_ne!(a, b);
        assert_ne!(a, c);
        Ok(())
    }

    #[test]
    fn keys_should_not_collide_across_parameter_boundaries() -> Result<()> {
        let one = MarketId::from(1_u64);
        let twelve = MarketId::from(12_u64);

        let a = CacheKey::new(
            "mytrades",
            &MyTradesParams {
                marketid: &one,
                limit: 2200,
            },
        )?;
        let b = CacheKey::new(
            "mytrades",
            &MyTradesParams {
                marketid: &twelve,
                limit: 200,
            },
        )?;

        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn cached_read_should_fetch_once() -> Result<()> {
        let mut cache = ResultCache::default();
        let calls = Cell::new(0);
        let fetch = || -> Result<Value> {
            calls.set(calls.get() + 1);
            Ok(json!({ "n": calls.get() }))
        };

        let first = cache.get_or_refresh(key("getinfo"), true, fetch)?;
        let second = cache.get_or_refresh(key("getinfo"), true, fetch)?;

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn uncached_read_should_refresh_stored_value() -> Result<()> {
        let mut cache = ResultCache::default();

        cache.get_or_refresh(key("getinfo"), true, || Ok(json!(1)))?;
        let refreshed = cache.get_or_refresh(key("getinfo"), false, || Ok(json!(2)))?;
        let cached = cache.get_or_refresh(key("getinfo"), true, || Ok(json!(3)))?;

        assert_eq!(refreshed, json!(2));
        assert_eq!(cached, json!(2));
        Ok(())
    }

    #[test]
    fn failed_fetch_should_keep_previous_entry() -> Result<()> {
        let mut cache = ResultCache::default();

        cache.get_or_refresh(key("getinfo"), true, || Ok(json!("old")))?;
        let failed =
            cache.get_or_refresh(key("getinfo"), false, || Err(Error::validation("boom")));
        let cached = cache.get_or_refresh(key("getinfo"), true, || Ok(json!("new")))?;

        assert!(failed.is_err());
        assert_eq!(cached, json!("old"));
        Ok(())
    }

    #[test]
    fn clear_should_drop_all_entries() -> Result<()> {
        let mut cache = ResultCache::default();

        cache.get_or_refresh(key("getinfo"), true, || Ok(json!(1)))?;
        cache.get_or_refresh(key("getmarkets"), true, || Ok(json!(2)))?;
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert_eq!(cache.len(), 0);
        Ok(())
    }
}
