use ferrous_forwarder_domain::CacheConfig;

/// Expiry rules for stored answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub min_ttl: u32,
    pub max_ttl: u32,
    pub negative_ttl: u32,
}

impl TtlPolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            min_ttl: config.min_ttl,
            max_ttl: config.max_ttl,
            negative_ttl: config.negative_ttl,
        }
    }

    /// Lifetime of a positive answer whose smallest record TTL is `min_record_ttl`.
    pub fn positive(&self, min_record_ttl: u32) -> u32 {
        min_record_ttl.clamp(self.min_ttl, self.max_ttl.max(self.min_ttl))
    }

    /// Lifetime of an NXDOMAIN/NODATA answer. An authority SOA can only
    /// shorten the configured negative TTL.
    pub fn negative(&self, soa_ttl: Option<u32>) -> u32 {
        soa_ttl
            .map_or(self.negative_ttl, |soa| soa.min(self.negative_ttl))
            .max(self.min_ttl)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TtlPolicy {
        TtlPolicy {
            min_ttl: 5,
            max_ttl: 3600,
            negative_ttl: 300,
        }
    }

    #[test]
    fn test_positive_ttl_is_clamped() {
        assert_eq!(policy().positive(0), 5);
        assert_eq!(policy().positive(120), 120);
        assert_eq!(policy().positive(86_400), 3600);
    }

    #[test]
    fn test_negative_ttl_uses_soa_only_when_lower() {
        assert_eq!(policy().negative(None), 300);
        assert_eq!(policy().negative(Some(60)), 60);
        assert_eq!(policy().negative(Some(900)), 300);
        assert_eq!(policy().negative(Some(0)), 5);
    }
}
