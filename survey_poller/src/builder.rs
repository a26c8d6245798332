use crate::clock::{CancelToken, Clock, SystemClock};
pub use crate::config::*;
use crate::{Poller, ResponseConsumer, ResponseSource};

/// A builder for assembling a [`Poller`].
///
/// The rules are checked when the builder is created, so that a bad
/// configuration is reported before any fetch happens.
///
/// ```
/// use std::time::Duration;
/// use survey_poller::builder::PollerBuilder;
/// use survey_poller::clock::ManualClock;
/// use survey_poller::*;
///
/// let rules = PollRules {
///     interval: Duration::from_secs(30),
///     duration: RunDuration::Bounded(Duration::from_secs(90)),
///     ..PollRules::default()
/// };
/// let mut poller = PollerBuilder::new(&rules)?
///     .clock(ManualClock::new())
///     .build(
///         source_fn(|| Ok(vec![])),
///         consumer_fn(|_batch: &Batch<'_>| Ok(())),
///     );
/// let stats = poller.run();
/// assert_eq!(stats.iterations, 3);
///
/// # Ok::<(), PollErrors>(())
/// ```
pub struct PollerBuilder<K = SystemClock> {
    pub(crate) _rules: PollRules,
    pub(crate) _watermark: Watermark,
    pub(crate) _clock: K,
    pub(crate) _cancel: Option<CancelToken>,
}

impl PollerBuilder<SystemClock> {
    pub fn new(rules: &PollRules) -> Result<PollerBuilder<SystemClock>, PollErrors> {
        rules.validate()?;
        Ok(PollerBuilder {
            _rules: rules.clone(),
            _watermark: Watermark::NONE,
            _clock: SystemClock::new(),
            _cancel: None,
        })
    }
}

impl<K: Clock> PollerBuilder<K> {
    /// Starts from a watermark remembered from an earlier run.
    pub fn initial_watermark(self, watermark: Watermark) -> PollerBuilder<K> {
        PollerBuilder {
            _watermark: watermark,
            ..self
        }
    }

    pub fn clock<K2: Clock>(self, clock: K2) -> PollerBuilder<K2> {
        PollerBuilder {
            _rules: self._rules,
            _watermark: self._watermark,
            _clock: clock,
            _cancel: self._cancel,
        }
    }

    /// Shares an existing token, for instance one already wired to Ctrl-C.
    pub fn cancel_token(self, token: CancelToken) -> PollerBuilder<K> {
        PollerBuilder {
            _cancel: Some(token),
            ..self
        }
    }

    pub fn build<S, C>(self, source: S, consumer: C) -> Poller<S, C, K>
    where
        S: ResponseSource,
        C: ResponseConsumer,
    {
        Poller {
            source,
            consumer,
            clock: self._clock,
            cancel: self._cancel.unwrap_or_default(),
            rules: self._rules,
            watermark: self._watermark,
            untimed_reported: 0,
            stats: RunStats {
                watermark: self._watermark,
                ..RunStats::default()
            },
        }
    }
}
