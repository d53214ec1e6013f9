use blogwerk_db::client::Page;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl PaginationConfig {
    #[must_use]
    pub fn new(default_limit: Option<u32>, max_limit: Option<u32>) -> Self {
        Self {
            default_limit: default_limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            max_limit: max_limit.unwrap_or(MAX_PAGE_LIMIT),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// `?limit=&offset=` query parameters, both optional.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageQuery {
    #[must_use]
    pub fn resolve(self, config: PaginationConfig) -> Page {
        let limit = self
            .limit
            .unwrap_or(config.default_limit)
            .min(config.max_limit);

        Page {
            limit: i64::from(limit),
            offset: i64::from(self.offset.unwrap_or(0)),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use crate::server::pagination::{PageQuery, PaginationConfig};

    #[test]
    fn missing_parameters_use_the_defaults() {
        let page = PageQuery::default().resolve(PaginationConfig::default());

        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn limits_are_capped_at_the_configured_maximum() {
        let query = PageQuery {
            limit: Some(100_000),
            offset: Some(20),
        };
        let page = query.resolve(PaginationConfig::default());

        assert_eq!(page.limit, 100);
        assert_eq!(page.offset, 20);
    }

    #[test]
    fn explicit_parameters_are_respected() {
        let query = PageQuery {
            limit: Some(5),
            offset: Some(15),
        };
        let page = query.resolve(PaginationConfig::new(Some(25), Some(50)));

        assert_eq!(page.limit, 5);
        assert_eq!(page.offset, 15);
    }
}
