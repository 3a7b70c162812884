mod record;
mod row;

pub use self::record::{HrefText, SEARCH_CACHE_VERSION, SearchCacheRecord};
pub(crate) use self::row::SearchCacheRow;
