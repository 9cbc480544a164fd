use bon::Builder;

use crate::api::policy::NoncePolicy;

/// Client-wide behavior, fixed at construction.
///
/// ```
/// use cryptsy_client_sdk::api::Config;
///
/// let config = Config::builder().simulation(true).caching(true).build();
/// assert!(config.simulation());
/// ```
#[derive(Clone, Copy, Debug, Default, Builder)]
pub struct Config {
    /// Suppress every state-mutating call; writes return `None` without touching the
    /// network.
    #[builder(default)]
    simulation: bool,
    /// Default caching behavior for read operations.
    #[builder(default)]
    caching: bool,
    #[builder(default)]
    nonce: NoncePolicy,
}

impl Config {
    #[must_use]
    pub const fn simulation(&self) -> bool {
        self.simulation
    }

    #[must_use]
    pub const fn caching(&self) -> bool {
        self.caching
    }

    #[must_use]
    pub const fn nonce(&self) -> NoncePolicy {
        self.nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_should_match_empty_builder() {
        let default = Config::default();
        let built = Config::builder().build();

        assert_eq!(default.simulation(), built.simulation());
        assert_eq!(default.caching(), built.caching());
        assert_eq!(default.nonce(), built.nonce());
        assert!(!default.simulation());
        assert!(!default.caching());
        assert_eq!(default.nonce(), NoncePolicy::Increasing);
    }

    #[test]
    fn builder_should_set_flags() {
        let config = Config::builder()
            .simulation(true)
            .caching(true)
            .nonce(NoncePolicy::Random)
            .build();

        assert!(config.simulation());
        assert!(config.caching());
        assert_eq!(config.nonce(), NoncePolicy::Random);
    }
}
