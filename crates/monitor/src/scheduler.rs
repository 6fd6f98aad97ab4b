//! The tick loop: acquire, estimate, report, wait.

use chrono::Local;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ups_config::{CalibrationConfig, OperatingLimits};
use ups_core::{HostMetrics, ReportSink, Result};
use ups_estimator::{check_limits, Estimator, EstimatorMemory};
use ups_report::Sinks;
use ups_sensor::{I2cTransport, SampleAcquirer};
use ups_system::HostProbe;

/// Source of per-tick host metrics.
pub trait HostSource: Send {
    fn sample(&mut self) -> HostMetrics;
}

impl HostSource for HostProbe {
    fn sample(&mut self) -> HostMetrics {
        HostProbe::sample(self)
    }
}

/// Loop pacing and stop conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    pub interval: Duration,
    /// Stop after this many ticks, failed ones included.
    pub max_ticks: Option<u64>,
    /// Abort once this many ticks in a row have failed.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_ticks: None,
            max_consecutive_failures: None,
        }
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub readings: u64,
    pub failures: u64,
    pub cancelled: bool,
}

/// Owns everything the loop touches for the lifetime of one run.
pub struct Monitor<T, H> {
    acquirer: SampleAcquirer<T>,
    estimator: Estimator,
    memory: EstimatorMemory,
    limits: OperatingLimits,
    host: H,
    sinks: Sinks,
    options: LoopOptions,
}

impl<T: I2cTransport, H: HostSource> Monitor<T, H> {
    pub fn new(
        acquirer: SampleAcquirer<T>,
        calibration: &CalibrationConfig,
        host: H,
        sinks: Sinks,
        options: LoopOptions,
    ) -> Self {
        let estimator = Estimator::new(calibration);
        let memory = estimator.memory();
        Self {
            acquirer,
            estimator,
            memory,
            limits: calibration.limits,
            host,
            sinks,
            options,
        }
    }

    /// Run until cancelled, `max_ticks` is reached or the failure bound trips.
    ///
    /// Sinks are closed and the bus released on every exit path.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let outcome = self.run_ticks(&cancel, &mut summary).await;

        if let Err(e) = self.sinks.close() {
            warn!("Closing sinks failed: {e}");
        }
        drop(self.acquirer);
        debug!("Sensor released");

        info!(
            "Monitor stopped after {} ticks ({} readings, {} failed)",
            summary.ticks, summary.readings, summary.failures
        );
        outcome.map(|()| summary)
    }

    async fn run_ticks(
        &mut self,
        cancel: &CancellationToken,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mut consecutive = 0u32;

        loop {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                return Ok(());
            }
            if self.reached_max_ticks(summary) {
                return Ok(());
            }

            let result = self.tick();
            summary.ticks += 1;
            match result {
                Ok(()) => {
                    consecutive = 0;
                    summary.readings += 1;
                }
                Err(e) => {
                    warn!("Tick skipped: {e}");
                    if let Err(sink_err) = self.sinks.no_reading(Local::now(), &e) {
                        warn!("Recording missed tick failed: {sink_err}");
                    }
                    consecutive += 1;
                    summary.failures += 1;
                    if self
                        .options
                        .max_consecutive_failures
                        .is_some_and(|max| consecutive >= max)
                    {
                        warn!("{consecutive} consecutive failed ticks; giving up");
                        return Err(e);
                    }
                }
            }

            // No trailing sleep after the last tick.
            if self.reached_max_ticks(summary) {
                return Ok(());
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    return Ok(());
                }
                _ = tokio::time::sleep(self.options.interval) => {}
            }
        }
    }

    fn reached_max_ticks(&self, summary: &RunSummary) -> bool {
        self.options
            .max_ticks
            .is_some_and(|max| summary.ticks >= max)
    }

    fn tick(&mut self) -> Result<()> {
        let sample = self.acquirer.read()?;
        for violation in check_limits(&sample, &self.limits) {
            warn!("{violation}");
        }
        let host = self.host.sample();

        let memory = std::mem::replace(&mut self.memory, self.estimator.memory());
        let (record, memory) = self.estimator.estimate(sample, host, memory);
        self.memory = memory;

        self.sinks.report(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};
    use ups_core::{DerivedRecord, PowerStage, UpsError};
    use ups_report::CsvLog;
    use ups_sensor::{connect, MemoryTransport};

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Reading(f64, PowerStage),
        Missed(String),
        Closed,
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Seen>>>);

    impl Recorder {
        fn seen(&self) -> Vec<Seen> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ReportSink for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn report(&mut self, record: &DerivedRecord) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .push(Seen::Reading(record.sample.voltage_v, record.stage));
            Ok(())
        }

        fn no_reading(&mut self, _at: DateTime<Local>, error: &UpsError) -> Result<()> {
            self.0.lock().unwrap().push(Seen::Missed(error.to_string()));
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.0.lock().unwrap().push(Seen::Closed);
            Ok(())
        }
    }

    struct FixedHost;

    impl HostSource for FixedHost {
        fn sample(&mut self) -> HostMetrics {
            HostMetrics {
                cpu_temp_c: Some(48.0),
                cpu_pct: None,
                mem_pct: Some(31.0),
            }
        }
    }

    /// Device reporting 5.924 V and -0.0004 A on every read.
    fn device() -> MemoryTransport {
        MemoryTransport::new()
            .with_word(0x02, 0x2E48)
            .with_word(0x01, 0xFFFC)
    }

    fn options(max_ticks: Option<u64>) -> LoopOptions {
        LoopOptions {
            interval: Duration::from_millis(1),
            max_ticks,
            max_consecutive_failures: None,
        }
    }

    fn monitor(
        transport: MemoryTransport,
        sinks: Sinks,
        options: LoopOptions,
    ) -> Monitor<MemoryTransport, FixedHost> {
        let cal = CalibrationConfig::default();
        let acquirer = connect(transport, &cal.sensor).unwrap();
        Monitor::new(acquirer, &cal, FixedHost, sinks, options)
    }

    #[tokio::test]
    async fn stops_after_max_ticks_and_closes_sinks() {
        let rec = Recorder::default();
        let summary = monitor(device(), Sinks::new().with(rec.clone()), options(Some(3)))
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.readings, 3);
        assert!(!summary.cancelled);

        let seen = rec.seen();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3], Seen::Closed);
        for s in &seen[..3] {
            match s {
                Seen::Reading(v, stage) => {
                    assert!((v - 5.924).abs() < 1e-9);
                    assert_eq!(*stage, PowerStage::Idle);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn mid_loop_failure_skips_exactly_one_tick() {
        // Reads 0 and 1 are the calibration read-back; read 4 is the second
        // tick's bus voltage.
        let rec = Recorder::default();
        let summary = monitor(
            device().failing_reads([4]),
            Sinks::new().with(rec.clone()),
            options(Some(3)),
        )
        .run(CancellationToken::new())
        .await
        .unwrap();

        assert_eq!(summary.failures, 1);
        assert_eq!(summary.readings, 2);

        let seen = rec.seen();
        assert!(matches!(seen[0], Seen::Reading(..)));
        assert!(matches!(&seen[1], Seen::Missed(msg) if msg.contains("sensor unavailable")));
        assert!(matches!(seen[2], Seen::Reading(..)));
        assert_eq!(seen[3], Seen::Closed);
        assert_eq!(
            seen.iter().filter(|s| matches!(s, Seen::Missed(_))).count(),
            1
        );
    }

    #[tokio::test]
    async fn consecutive_failure_bound_ends_run() {
        let rec = Recorder::default();
        let mut opts = options(None);
        opts.max_consecutive_failures = Some(2);

        let err = monitor(
            MemoryTransport::new()
                .with_word(0x02, 0x2E48)
                .failing_reads(2..1000),
            Sinks::new().with(rec.clone()),
            opts,
        )
        .run(CancellationToken::new())
        .await
        .unwrap_err();

        assert!(matches!(err, UpsError::SensorUnavailable(_)));
        let seen = rec.seen();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], Seen::Closed);
    }

    #[tokio::test]
    async fn zero_max_ticks_runs_no_tick() {
        let rec = Recorder::default();
        let transport = device();
        let released = transport.release_flag();

        let summary = tokio::time::timeout(
            Duration::from_millis(500),
            monitor(transport, Sinks::new().with(rec.clone()), options(Some(0)))
                .run(CancellationToken::new()),
        )
        .await
        .expect("loop with a zero tick budget must return")
        .unwrap();

        assert_eq!(summary.ticks, 0);
        assert!(!summary.cancelled);
        assert_eq!(rec.seen(), vec![Seen::Closed]);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancel_before_first_tick_still_closes() {
        let rec = Recorder::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = monitor(device(), Sinks::new().with(rec.clone()), options(None))
            .run(cancel)
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.ticks, 0);
        assert_eq!(rec.seen(), vec![Seen::Closed]);
    }

    #[tokio::test]
    async fn interruption_releases_bus_and_leaves_log_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ups.csv");
        let transport = device();
        let released = transport.release_flag();

        let sinks = Sinks::new().with(CsvLog::open(&path).unwrap());
        let mut opts = options(None);
        opts.interval = Duration::from_millis(5);

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            stopper.cancel();
        });

        let summary = monitor(transport, sinks, opts).run(cancel).await.unwrap();

        assert!(summary.cancelled);
        assert!(summary.ticks >= 1);
        assert!(released.load(Ordering::SeqCst));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ups_report::csv::HEADER);
        assert_eq!(lines.len() as u64, summary.ticks + 1);
        for row in &lines[1..] {
            assert_eq!(row.split(',').count(), ups_report::csv::COLUMNS);
            assert!(row.contains(",5.924,"));
        }
    }

    #[test]
    fn default_options_tick_every_two_seconds() {
        let opts = LoopOptions::default();
        assert_eq!(opts.interval, Duration::from_secs(2));
        assert_eq!(opts.max_ticks, None);
    }
}
