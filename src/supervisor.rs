//! Worker lifecycle: shared state construction, thread startup and teardown.

use crate::{
    actuator::{ActuatorDriver, AxisOutput},
    axis_controller::{Axis, AxisController},
    config::Config,
    detection::{Detector, FrameSource, ObjectDetector},
    error::{Error, Result},
    servo::ServoSink,
    shared_state::SharedState,
};
use log::{error, info};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Tracker ready to start: validated configuration plus its collaborators
pub struct Tracker<S, D, K> {
    config: Config,
    detector: Detector<S, D>,
    sink: K,
}

impl<S, D, K> Tracker<S, D, K>
where
    S: FrameSource + 'static,
    D: ObjectDetector<S::Frame> + 'static,
    K: ServoSink + 'static,
{
    /// Validate the configuration and assemble the pipeline
    pub fn new(config: Config, source: S, detector: D, sink: K) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: Detector::new(source, detector),
            sink,
        })
    }

    /// Spawn the detector, both axis controllers and the actuator driver
    pub fn start(self) -> Result<TrackerHandle> {
        let Self {
            config,
            mut detector,
            sink,
        } = self;

        let shared = Arc::new(SharedState::new(config.pan.neutral_angle, config.tilt.neutral_angle));
        let timing = config.timing.clone();
        let poll = timing.shutdown_poll();
        let mut handle = TrackerHandle {
            shared: Arc::clone(&shared),
            workers: Vec::with_capacity(4),
        };

        info!(
            "Starting tracker: pan gains {:?}, tilt gains {:?}",
            config.pan.gains, config.tilt.gains
        );

        let mut driver = ActuatorDriver::new(
            sink,
            AxisOutput {
                range: config.pan.range(),
                neutral_angle: config.pan.neutral_angle,
            },
            AxisOutput {
                range: config.tilt.range(),
                neutral_angle: config.tilt.neutral_angle,
            },
            config.servo.out_of_range,
        );
        let state = Arc::clone(&shared);
        let interval = timing.driver_interval();
        handle.spawn("actuator", move || driver.run(&state, interval, poll))?;

        for axis in Axis::ALL {
            let axis_config = match axis {
                Axis::Pan => &config.pan,
                Axis::Tilt => &config.tilt,
            };
            let mut controller = AxisController::new(axis, axis_config);
            let state = Arc::clone(&shared);
            let interval = timing.controller_interval();
            handle.spawn(axis.name(), move || controller.run(&state, interval, poll))?;
        }

        let state = Arc::clone(&shared);
        let idle = timing.detector_idle();
        handle.spawn("detector", move || detector.run(&state, idle, poll))?;

        Ok(handle)
    }
}

/// Running tracker
pub struct TrackerHandle {
    shared: Arc<SharedState>,
    workers: Vec<(String, JoinHandle<()>)>,
}

impl TrackerHandle {
    fn spawn<F>(&mut self, name: &str, work: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        match thread::Builder::new().name(name.to_string()).spawn(work) {
            Ok(join) => {
                self.workers.push((name.to_string(), join));
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn {} worker: {}", name, e);
                self.shared.request_shutdown();
                let _ = self.join_all();
                Err(Error::Worker(format!("Failed to spawn {name} worker: {e}")))
            }
        }
    }

    /// State shared with the workers
    #[must_use]
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Ask all workers to stop after their current cycle
    pub fn request_shutdown(&self) {
        info!("Shutdown requested");
        self.shared.request_shutdown();
    }

    /// Wait for every worker to exit
    pub fn join(mut self) -> Result<()> {
        self.join_all()
    }

    /// Request shutdown and wait for every worker
    pub fn shutdown(self) -> Result<()> {
        self.request_shutdown();
        self.join()
    }

    fn join_all(&mut self) -> Result<()> {
        let mut panicked = Vec::new();
        for (name, join) in self.workers.drain(..) {
            if join.join().is_err() {
                error!("{} worker panicked", name);
                panicked.push(name);
            }
        }
        if panicked.is_empty() {
            info!("All workers stopped");
            Ok(())
        } else {
            Err(Error::Worker(format!("Worker(s) panicked: {}", panicked.join(", "))))
        }
    }
}
