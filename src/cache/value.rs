//! Encoding of cached values
//!
//! Raw documents are stored verbatim as UTF-8 bytes. Parsed values (link
//! lists, runner records) are stored as JSON.

use crate::cache::traits::{CacheError, CacheResult};
use crate::record::RunnerRecord;

/// A value that can be stored in and restored from the cache
pub trait CacheValue: Sized {
    fn encode(&self) -> CacheResult<Vec<u8>>;
    fn decode(bytes: &[u8]) -> CacheResult<Self>;
}

impl CacheValue for String {
    fn encode(&self) -> CacheResult<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> CacheResult<Self> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CacheError::Codec(e.to_string()))
    }
}

macro_rules! json_cache_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CacheValue for $ty {
                fn encode(&self) -> CacheResult<Vec<u8>> {
                    serde_json::to_vec(self).map_err(|e| CacheError::Codec(e.to_string()))
                }

                fn decode(bytes: &[u8]) -> CacheResult<Self> {
                    serde_json::from_slice(bytes).map_err(|e| CacheError::Codec(e.to_string()))
                }
            }
        )*
    };
}

json_cache_value!(RunnerRecord, Vec<String>);
