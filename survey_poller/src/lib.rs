/*!
Incremental polling of survey responses.

A [`Poller`] repeatedly asks a [`ResponseSource`] for the complete current set
of responses, works out which ones arrived since the last successful fetch,
and hands them to a [`ResponseConsumer`] together with the full set.

The only state carried between iterations is the [`Watermark`]: the latest
submission time seen so far. Failures inside an iteration are logged and
never stop the loop.

See the [`quick_start`] module for an example and [`manual`] for the command
line tool built on top of this library.
*/

pub mod builder;
pub mod clock;
mod config;
pub mod manual;
pub mod quick_start;

use log::{debug, info, warn};

use chrono::NaiveDateTime;

use crate::clock::{CancelToken, Clock, SystemClock};
pub use crate::config::*;

// ********* Delta computation ***********

/// The result of comparing one fetch against the watermark.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Delta {
    /// Records strictly newer than the watermark, in source order.
    pub new_records: Vec<ResponseRecord>,
    /// The latest timestamp in the whole fetch, old records included.
    pub max_timestamp: Option<NaiveDateTime>,
    /// Records left out because their timestamp is missing or unreadable.
    pub untimed: usize,
}

/// Selects the records of `records` that are newer than `watermark`.
///
/// This is a pure function: the watermark is not modified.
///
/// ```
/// use survey_poller::*;
///
/// let header = vec!["Timestamp".to_string(), "Name".to_string()];
/// let row = |ts: &str, name: &str| {
///     ResponseRecord::from_row(&header, &[ts.to_string(), name.to_string()])
/// };
/// let records = vec![row("11/15/2025 10:00:00", "Ada"), row("11/15/2025 10:02:00", "Bob")];
/// let field = TimestampField::new("Timestamp");
/// let seen = Watermark::at(field.parse_str("11/15/2025 10:01:00").unwrap());
///
/// let delta = compute_delta(&seen, &records, &field);
/// assert_eq!(delta.new_records, vec![records[1].clone()]);
/// ```
pub fn compute_delta(
    watermark: &Watermark,
    records: &[ResponseRecord],
    timestamp: &TimestampField,
) -> Delta {
    let mut delta = Delta::default();
    for record in records {
        match timestamp.parse(record) {
            Some(ts) => {
                if delta.max_timestamp.map_or(true, |m| m < ts) {
                    delta.max_timestamp = Some(ts);
                }
                if watermark.is_before(&ts) {
                    delta.new_records.push(record.clone());
                }
            }
            None => {
                debug!("compute_delta: no usable timestamp in {:?}", record);
                delta.untimed += 1;
            }
        }
    }
    delta
}

// ********* Collaborators ***********

/// Anything that can return the complete current set of responses.
pub trait ResponseSource {
    fn fetch(&mut self) -> Result<Vec<ResponseRecord>, BoxError>;
}

/// What a consumer receives on each successful fetch.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// 1-based iteration number, counting failed iterations too.
    pub iteration: u64,
    pub new_records: &'a [ResponseRecord],
    pub all_records: &'a [ResponseRecord],
    /// The watermark after this iteration.
    pub watermark: Watermark,
}

impl<'a> Batch<'a> {
    pub fn is_empty(&self) -> bool {
        self.new_records.is_empty()
    }
}

/// Receives the new records and the full set. Empty batches are delivered
/// too; skipping them is the consumer's choice.
pub trait ResponseConsumer {
    fn consume(&mut self, batch: &Batch<'_>) -> Result<(), BoxError>;
}

impl<S: ResponseSource + ?Sized> ResponseSource for Box<S> {
    fn fetch(&mut self) -> Result<Vec<ResponseRecord>, BoxError> {
        (**self).fetch()
    }
}

impl<C: ResponseConsumer + ?Sized> ResponseConsumer for Box<C> {
    fn consume(&mut self, batch: &Batch<'_>) -> Result<(), BoxError> {
        (**self).consume(batch)
    }
}

/// Adapter returned by [`source_fn`].
pub struct FnSource<F>(F);

/// Turns a closure into a [`ResponseSource`].
pub fn source_fn<F>(f: F) -> FnSource<F>
where
    F: FnMut() -> Result<Vec<ResponseRecord>, BoxError>,
{
    FnSource(f)
}

impl<F> ResponseSource for FnSource<F>
where
    F: FnMut() -> Result<Vec<ResponseRecord>, BoxError>,
{
    fn fetch(&mut self) -> Result<Vec<ResponseRecord>, BoxError> {
        (self.0)()
    }
}

/// Adapter returned by [`consumer_fn`].
pub struct FnConsumer<F>(F);

/// Turns a closure into a [`ResponseConsumer`].
pub fn consumer_fn<F>(f: F) -> FnConsumer<F>
where
    F: FnMut(&Batch<'_>) -> Result<(), BoxError>,
{
    FnConsumer(f)
}

impl<F> ResponseConsumer for FnConsumer<F>
where
    F: FnMut(&Batch<'_>) -> Result<(), BoxError>,
{
    fn consume(&mut self, batch: &Batch<'_>) -> Result<(), BoxError> {
        (self.0)(batch)
    }
}

// ********* The polling loop ***********

/// Drives fetch / diff / consume cycles.
///
/// Build one with [`builder::PollerBuilder`].
pub struct Poller<S, C, K = SystemClock> {
    pub(crate) source: S,
    pub(crate) consumer: C,
    pub(crate) clock: K,
    pub(crate) cancel: CancelToken,
    pub(crate) rules: PollRules,
    pub(crate) watermark: Watermark,
    // Untimed count at the last warning, so that the same rows are not
    // reported on every iteration.
    pub(crate) untimed_reported: usize,
    pub(crate) stats: RunStats,
}

impl<S, C, K> Poller<S, C, K>
where
    S: ResponseSource,
    C: ResponseConsumer,
    K: Clock,
{
    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    pub fn rules(&self) -> &PollRules {
        &self.rules
    }

    /// A handle that stops [`Poller::run`] at the next iteration boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Runs a single iteration. Never fails: problems are reported in the
    /// returned outcome and in the logs.
    pub fn poll_once(&mut self) -> IterationOutcome {
        self.stats.iterations += 1;
        let iteration = self.stats.iterations;

        let records = match self.source.fetch() {
            Ok(records) => records,
            Err(e) => {
                warn!("Iteration {}: fetch failed: {}", iteration, e);
                self.stats.fetch_failures += 1;
                return IterationOutcome::FetchFailed(IterationFailure::Fetch(e));
            }
        };

        let delta = compute_delta(&self.watermark, &records, &self.rules.timestamp);
        self.report_untimed(iteration, delta.untimed);
        if !delta.new_records.is_empty() {
            if let Some(ts) = delta.max_timestamp {
                self.watermark.advance(ts);
            }
        }
        info!(
            "Iteration {}: {} new / {} total responses (watermark {})",
            iteration,
            delta.new_records.len(),
            records.len(),
            self.watermark
        );

        let batch = Batch {
            iteration,
            new_records: &delta.new_records,
            all_records: &records,
            watermark: self.watermark,
        };
        self.stats.watermark = self.watermark;
        let new = delta.new_records.len();
        let total = records.len();
        match self.consumer.consume(&batch) {
            Ok(()) => {
                self.stats.deliveries += 1;
                IterationOutcome::Delivered { new, total }
            }
            Err(e) => {
                warn!("Iteration {}: consumer failed: {}", iteration, e);
                self.stats.consume_failures += 1;
                IterationOutcome::ConsumeFailed {
                    new,
                    total,
                    failure: IterationFailure::Consume(e),
                }
            }
        }
    }

    /// Warns when the number of untimed records changes. Returns whether it did.
    fn report_untimed(&mut self, iteration: u64, untimed: usize) -> bool {
        if untimed == self.untimed_reported {
            if untimed > 0 {
                debug!("Iteration {}: still {} untimed response(s)", iteration, untimed);
            }
            return false;
        }
        self.untimed_reported = untimed;
        if untimed > 0 {
            warn!(
                "Iteration {}: {} response(s) without a readable {:?} value",
                iteration, untimed, self.rules.timestamp.column
            );
            true
        } else {
            false
        }
    }

    /// Polls until the run duration has elapsed or the token is cancelled.
    ///
    /// Iterations never overlap. Between two iterations the loop waits for
    /// the interval, cut short by the end of the run.
    pub fn run(&mut self) -> RunStats {
        let start = self.clock.elapsed();
        info!(
            "Polling every {:?} for {:?}, starting from watermark {}",
            self.rules.interval, self.rules.duration, self.watermark
        );
        loop {
            if self.cancel.is_cancelled() {
                info!("Polling cancelled after {} iteration(s)", self.stats.iterations);
                self.stats.cancelled = true;
                break;
            }
            let elapsed = self.clock.elapsed().saturating_sub(start);
            if self.rules.duration.is_over(elapsed) {
                break;
            }

            self.poll_once();

            let elapsed = self.clock.elapsed().saturating_sub(start);
            let wait = match self.rules.duration.remaining(elapsed) {
                Some(left) if left.is_zero() => break,
                Some(left) => left.min(self.rules.interval),
                None => self.rules.interval,
            };
            debug!("Next refresh in {:?}", wait);
            self.clock.pause(wait, &self.cancel);
        }
        self.stats.watermark = self.watermark;
        info!(
            "Polling finished: {} iteration(s), {} delivered, {} fetch failure(s), {} consumer failure(s)",
            self.stats.iterations,
            self.stats.deliveries,
            self.stats.fetch_failures,
            self.stats.consume_failures
        );
        self.stats.clone()
    }

    /// Gives back the source and the consumer.
    pub fn into_parts(self) -> (S, C) {
        (self.source, self.consumer)
    }
}

#[cfg(test)]
mod tests {
    use super::builder::PollerBuilder;
    use super::clock::ManualClock;
    use super::*;
    use chrono::{Local, TimeZone};
    use std::collections::VecDeque;
    use std::time::Duration;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn header() -> Vec<String> {
        vec!["Timestamp".to_string(), "Name".to_string()]
    }

    fn rec(ts: &str, name: &str) -> ResponseRecord {
        ResponseRecord::from_row(&header(), &[ts.to_string(), name.to_string()])
    }

    fn at(hm: &str) -> String {
        format!("11/15/2025 {}:00", hm)
    }

    fn ts(hm: &str) -> NaiveDateTime {
        TimestampField::new("Timestamp").parse_str(&at(hm)).unwrap()
    }

    fn field() -> TimestampField {
        TimestampField::new("Timestamp")
    }

    fn names(records: &[ResponseRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("Name").unwrap().to_string())
            .collect()
    }

    // A source replaying a script of fetch results, then repeating the last one.
    fn scripted(
        script: Vec<Result<Vec<ResponseRecord>, &'static str>>,
    ) -> impl ResponseSource {
        let mut script: VecDeque<_> = script.into();
        let mut last: Vec<ResponseRecord> = vec![];
        source_fn(move || match script.pop_front() {
            Some(Ok(records)) => {
                last = records.clone();
                Ok(records)
            }
            Some(Err(msg)) => Err(msg.into()),
            None => Ok(last.clone()),
        })
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Seen {
        iteration: u64,
        new: Vec<String>,
        total: usize,
        watermark: Watermark,
    }

    fn rules(interval_s: u64, duration: RunDuration) -> PollRules {
        PollRules {
            interval: Duration::from_secs(interval_s),
            duration,
            timestamp: field(),
        }
    }

    #[test]
    fn scenario_a_first_fetch_delivers_everything() {
        let records = vec![rec(&at("10:00"), "a"), rec(&at("10:01"), "b"), rec(&at("10:02"), "c")];
        let delta = compute_delta(&Watermark::NONE, &records, &field());
        assert_eq!(names(&delta.new_records), vec!["a", "b", "c"]);
        let mut w = Watermark::NONE;
        w.advance(delta.max_timestamp.unwrap());
        assert_eq!(w, Watermark::at(ts("10:02")));
    }

    #[test]
    fn scenario_b_only_strictly_newer_records() {
        let records = vec![
            rec(&at("10:00"), "a"),
            rec(&at("10:01"), "b"),
            rec(&at("10:02"), "c"),
            rec(&at("10:03"), "d"),
        ];
        let delta = compute_delta(&Watermark::at(ts("10:01")), &records, &field());
        assert_eq!(names(&delta.new_records), vec!["c", "d"]);
        assert_eq!(delta.max_timestamp, Some(ts("10:03")));
    }

    #[test]
    fn delta_keeps_source_order_and_ties() {
        let records = vec![
            rec(&at("10:05"), "late"),
            rec(&at("10:01"), "equal"),
            rec(&at("10:03"), "tie1"),
            rec(&at("10:03"), "tie2"),
            rec(&at("10:01"), "equal2"),
        ];
        let delta = compute_delta(&Watermark::at(ts("10:01")), &records, &field());
        assert_eq!(names(&delta.new_records), vec!["late", "tie1", "tie2"]);
    }

    #[test]
    fn delta_skips_untimed_records() {
        let records = vec![
            rec("", "blank"),
            rec("yesterday", "garbage"),
            rec(&at("10:00"), "ok"),
        ];
        let delta = compute_delta(&Watermark::NONE, &records, &field());
        assert_eq!(names(&delta.new_records), vec!["ok"]);
        assert_eq!(delta.untimed, 2);
    }

    #[test]
    fn delta_is_idempotent() {
        let records = vec![rec(&at("10:00"), "a"), rec(&at("10:02"), "b")];
        let w = Watermark::at(ts("10:01"));
        let first = compute_delta(&w, &records, &field());
        let second = compute_delta(&w, &records, &field());
        assert_eq!(first, second);
        assert_eq!(w, Watermark::at(ts("10:01")));
    }

    #[test]
    fn timestamp_formats() {
        let f = field();
        assert_eq!(f.parse_str("2025-11-15 10:00:00"), Some(ts("10:00")));
        assert_eq!(f.parse_str("2025-11-15T10:00:00.000"), Some(ts("10:00")));
        let local = Local.from_utc_datetime(&ts("10:00")).naive_local();
        assert_eq!(f.parse_str("2025-11-15T11:00:00+01:00"), Some(local));
        assert_eq!(f.parse_str("2025-11-15T10:00:00Z"), Some(local));
        assert_eq!(f.parse_str("15 Nov"), None);
    }

    #[test]
    fn watermark_never_moves_back() {
        let mut w = Watermark::at(ts("10:05"));
        assert!(!w.advance(ts("10:01")));
        assert!(!w.advance(ts("10:05")));
        assert!(w.advance(ts("10:06")));
        assert_eq!(w.value(), Some(ts("10:06")));
    }

    #[test]
    fn zero_duration_runs_nothing() {
        init();
        let mut calls = 0;
        let mut fetches = 0;
        let source = source_fn(|| {
            fetches += 1;
            Ok(vec![])
        });
        let consumer = consumer_fn(|_: &Batch<'_>| {
            calls += 1;
            Ok(())
        });
        let stats = PollerBuilder::new(&rules(1, RunDuration::Bounded(Duration::ZERO)))
            .unwrap()
            .clock(ManualClock::new())
            .build(source, consumer)
            .run();
        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.deliveries, 0);
        assert_eq!(calls, 0);
        assert_eq!(fetches, 0);
    }

    #[test]
    fn scenario_c_fetch_failure_is_skipped() {
        init();
        let mut seen: Vec<Seen> = vec![];
        let source = scripted(vec![
            Ok(vec![rec(&at("10:00"), "a")]),
            Err("network down"),
            Ok(vec![rec(&at("10:00"), "a"), rec(&at("10:04"), "b")]),
        ]);
        let consumer = consumer_fn(|b: &Batch<'_>| {
            seen.push(Seen {
                iteration: b.iteration,
                new: names(b.new_records),
                total: b.all_records.len(),
                watermark: b.watermark,
            });
            Ok(())
        });
        let clock = ManualClock::new();
        let stats = PollerBuilder::new(&rules(1, RunDuration::Bounded(Duration::from_secs(3))))
            .unwrap()
            .clock(clock.clone())
            .build(source, consumer)
            .run();

        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.deliveries, 2);
        assert_eq!(stats.watermark, Watermark::at(ts("10:04")));
        assert_eq!(
            seen,
            vec![
                Seen {
                    iteration: 1,
                    new: vec!["a".to_string()],
                    total: 1,
                    watermark: Watermark::at(ts("10:00")),
                },
                Seen {
                    iteration: 3,
                    new: vec!["b".to_string()],
                    total: 2,
                    watermark: Watermark::at(ts("10:04")),
                },
            ]
        );
        assert_eq!(clock.pauses(), vec![Duration::from_secs(1); 3]);
    }

    #[test]
    fn scenario_d_failing_consumer_does_not_stop_the_loop() {
        init();
        let source = scripted(vec![
            Ok(vec![rec(&at("10:00"), "a")]),
            Ok(vec![rec(&at("10:00"), "a"), rec(&at("10:01"), "b")]),
            Ok(vec![
                rec(&at("10:00"), "a"),
                rec(&at("10:01"), "b"),
                rec(&at("10:02"), "c"),
            ]),
        ]);
        let mut watermarks = vec![];
        let consumer = consumer_fn(|b: &Batch<'_>| {
            watermarks.push(b.watermark);
            Err("renderer crashed".into())
        });
        let stats = PollerBuilder::new(&rules(10, RunDuration::Bounded(Duration::from_secs(30))))
            .unwrap()
            .clock(ManualClock::new())
            .build(source, consumer)
            .run();
        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.consume_failures, 3);
        assert_eq!(stats.deliveries, 0);
        assert_eq!(
            watermarks,
            vec![
                Watermark::at(ts("10:00")),
                Watermark::at(ts("10:01")),
                Watermark::at(ts("10:02")),
            ]
        );
    }

    #[test]
    fn empty_batches_are_still_delivered() {
        let source = scripted(vec![Ok(vec![rec(&at("10:00"), "a")])]);
        let mut sizes = vec![];
        let consumer = consumer_fn(|b: &Batch<'_>| {
            sizes.push((b.new_records.len(), b.all_records.len()));
            Ok(())
        });
        PollerBuilder::new(&rules(5, RunDuration::Bounded(Duration::from_secs(15))))
            .unwrap()
            .clock(ManualClock::new())
            .build(source, consumer)
            .run();
        assert_eq!(sizes, vec![(1, 1), (0, 1), (0, 1)]);
    }

    #[test]
    fn watermark_is_the_max_over_all_fetches() {
        // Fetch order does not matter: a late row with an early timestamp
        // is delivered if it is newer than the watermark at that point.
        let source = scripted(vec![
            Ok(vec![rec(&at("10:03"), "a"), rec(&at("10:01"), "b")]),
            Ok(vec![rec(&at("10:02"), "c")]),
            Ok(vec![rec(&at("10:07"), "d"), rec(&at("10:05"), "e")]),
        ]);
        let mut poller = PollerBuilder::new(&rules(1, RunDuration::Unbounded))
            .unwrap()
            .clock(ManualClock::new())
            .build(source, consumer_fn(|_: &Batch<'_>| Ok(())));
        poller.poll_once();
        assert_eq!(poller.watermark(), Watermark::at(ts("10:03")));
        poller.poll_once();
        assert_eq!(poller.watermark(), Watermark::at(ts("10:03")));
        poller.poll_once();
        assert_eq!(poller.watermark(), Watermark::at(ts("10:07")));
    }

    #[test]
    fn initial_watermark_filters_the_first_fetch() {
        let source = scripted(vec![Ok(vec![rec(&at("10:00"), "a"), rec(&at("10:02"), "b")])]);
        let mut poller = PollerBuilder::new(&rules(1, RunDuration::Unbounded))
            .unwrap()
            .initial_watermark(Watermark::at(ts("10:01")))
            .clock(ManualClock::new())
            .build(
                source,
                consumer_fn(|b: &Batch<'_>| {
                    assert_eq!(names(b.new_records), vec!["b"]);
                    Ok(())
                }),
            );
        match poller.poll_once() {
            IterationOutcome::Delivered { new, total } => assert_eq!((new, total), (1, 2)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn cancellation_stops_before_the_next_fetch() {
        let token = CancelToken::new();
        let stopper = token.clone();
        let consumer = consumer_fn(move |b: &Batch<'_>| {
            if b.iteration == 2 {
                stopper.cancel();
            }
            Ok(())
        });
        let stats = PollerBuilder::new(&rules(1, RunDuration::Unbounded))
            .unwrap()
            .clock(ManualClock::new())
            .cancel_token(token)
            .build(scripted(vec![Ok(vec![])]), consumer)
            .run();
        assert_eq!(stats.iterations, 2);
        assert!(stats.cancelled);
    }

    #[test]
    fn last_wait_is_cut_to_the_deadline() {
        let clock = ManualClock::new();
        let stats = PollerBuilder::new(&rules(30, RunDuration::Bounded(Duration::from_secs(45))))
            .unwrap()
            .clock(clock.clone())
            .build(scripted(vec![Ok(vec![])]), consumer_fn(|_: &Batch<'_>| Ok(())))
            .run();
        assert_eq!(stats.iterations, 2);
        assert_eq!(
            clock.pauses(),
            vec![Duration::from_secs(30), Duration::from_secs(15)]
        );
    }

    #[test]
    fn slow_iterations_reduce_the_iteration_count() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let source = source_fn(move || {
            handle.advance(Duration::from_secs(20));
            Ok(vec![])
        });
        let stats = PollerBuilder::new(&rules(10, RunDuration::Bounded(Duration::from_secs(60))))
            .unwrap()
            .clock(clock)
            .build(source, consumer_fn(|_: &Batch<'_>| Ok(())))
            .run();
        // 0 -> 20 (+10) -> 30 -> 50 (+10) -> 60: two iterations
        assert_eq!(stats.iterations, 2);
    }

    #[test]
    fn cancel_wakes_a_real_pause() {
        init();
        let token = CancelToken::new();
        let stopper = token.clone();
        let consumer = consumer_fn(move |_: &Batch<'_>| {
            let stopper = stopper.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                stopper.cancel();
            });
            Ok(())
        });
        let started = std::time::Instant::now();
        let stats = PollerBuilder::new(&rules(3600, RunDuration::Unbounded))
            .unwrap()
            .cancel_token(token)
            .build(scripted(vec![Ok(vec![])]), consumer)
            .run();
        assert_eq!(stats.iterations, 1);
        assert!(stats.cancelled);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    // Same fetch results under two different timings give the same batches.
    #[test]
    fn batches_do_not_depend_on_timing() {
        let script = || {
            scripted(vec![
                Ok(vec![rec(&at("10:00"), "a")]),
                Err("timeout"),
                Ok(vec![rec(&at("10:00"), "a"), rec(&at("10:02"), "b")]),
                Ok(vec![rec(&at("10:00"), "a"), rec(&at("10:02"), "b")]),
            ])
        };
        let run = |interval_s: u64, duration_s: u64| {
            let mut log: Vec<(u64, Vec<String>, Watermark)> = vec![];
            let consumer = consumer_fn(|b: &Batch<'_>| {
                log.push((b.iteration, names(b.new_records), b.watermark));
                Ok(())
            });
            let stats = PollerBuilder::new(&rules(
                interval_s,
                RunDuration::Bounded(Duration::from_secs(duration_s)),
            ))
            .unwrap()
            .clock(ManualClock::new())
            .build(script(), consumer)
            .run();
            assert_eq!(stats.iterations, 4);
            log
        };
        let fast = run(1, 4);
        let slow = run(30, 120);
        assert_eq!(fast, slow);
        assert_eq!(
            fast.iter().map(|(i, _, _)| *i).collect::<Vec<u64>>(),
            vec![1, 3, 4]
        );
    }

    #[test]
    fn untimed_rows_are_reported_once() {
        let mut poller = PollerBuilder::new(&rules(1, RunDuration::Unbounded))
            .unwrap()
            .clock(ManualClock::new())
            .build(scripted(vec![Ok(vec![])]), consumer_fn(|_: &Batch<'_>| Ok(())));
        assert!(!poller.report_untimed(1, 0));
        assert!(poller.report_untimed(2, 2));
        assert!(!poller.report_untimed(3, 2));
        assert!(poller.report_untimed(4, 3));
        assert!(!poller.report_untimed(5, 0));
        assert!(poller.report_untimed(6, 3));
    }
}
