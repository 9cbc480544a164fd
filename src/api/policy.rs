use chrono::Utc;
use rand::Rng as _;

/// How the `nonce` field of each signed request is produced.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoncePolicy {
    /// Strictly increasing per client, seeded from the wall clock in milliseconds.
    #[default]
    Increasing,
    /// Uniform in `[0, 2^32)`, matching the legacy wire behavior.
    ///
    /// Nothing prevents two requests from drawing the same value, in which case the
    /// exchange may reject the second one as a replay.
    Random,
}

/// Per-client nonce generator following a [`NoncePolicy`].
#[derive(Clone, Debug)]
pub(crate) struct NonceSource {
    policy: NoncePolicy,
    last: u64,
}

impl NonceSource {
    pub(crate) const fn new(policy: NoncePolicy) -> Self {
        Self { policy, last: 0 }
    }

    pub(crate) fn next(&mut self) -> u64 {
        match self.policy {
            NoncePolicy::Increasing => {
                let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
                self.last = now.max(self.last + 1);
                self.last
            }
            NoncePolicy::Random => u64::from(rand::rng().random::<u32>()),
        }
    }
}

/// Resolves a per-call override against the client-wide default.
pub(crate) fn resolve(override_value: Option<bool>, default: bool) -> bool {
    override_value.unwrap_or(default)
}
