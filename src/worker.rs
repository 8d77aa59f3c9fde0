//! Background thread for blocking backend calls. The UI loop submits jobs
//! and drains results once per tick.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::api::{AllocationPlan, ApiClient, ApiError, DataSource, DetectionReport, Prediction, Weather};
use crate::map::{fetch_or_sample, LoadOutcome};
use crate::model::{Dataset, LatLng, RiskArea};

/// Everything the worker can ask of the backend
pub trait Backend: DataSource + Send + 'static {
    fn predict(&self, location: LatLng, weather: Weather) -> Result<Prediction, ApiError>;
    fn optimize(
        &self,
        areas: &[RiskArea],
        available: &BTreeMap<String, f64>,
    ) -> Result<AllocationPlan, ApiError>;
    fn detect(&self, image: &Path) -> Result<DetectionReport, ApiError>;
}

impl Backend for ApiClient {
    fn predict(&self, location: LatLng, weather: Weather) -> Result<Prediction, ApiError> {
        self.predict_risk(location, weather)
    }

    fn optimize(
        &self,
        areas: &[RiskArea],
        available: &BTreeMap<String, f64>,
    ) -> Result<AllocationPlan, ApiError> {
        self.optimize_resources(areas, available)
    }

    fn detect(&self, image: &Path) -> Result<DetectionReport, ApiError> {
        self.detect_fire(image)
    }
}

/// Backend used with `--offline`: every call fails, so loads fall back to the sample
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl Offline {
    fn error(endpoint: &str) -> ApiError {
        ApiError::Transport {
            url: format!("offline:/{endpoint}"),
            message: "network disabled".into(),
        }
    }
}

impl DataSource for Offline {
    fn fetch(&self) -> Result<Dataset, ApiError> {
        Err(Self::error("sample-data"))
    }
}

impl Backend for Offline {
    fn predict(&self, _location: LatLng, _weather: Weather) -> Result<Prediction, ApiError> {
        Err(Self::error("predict"))
    }

    fn optimize(
        &self,
        _areas: &[RiskArea],
        _available: &BTreeMap<String, f64>,
    ) -> Result<AllocationPlan, ApiError> {
        Err(Self::error("resources"))
    }

    fn detect(&self, _image: &Path) -> Result<DetectionReport, ApiError> {
        Err(Self::error("detect"))
    }
}

/// Resources offered to the optimizer when the user asks for a plan
pub fn default_available_resources() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("firefighters".to_string(), 100.0),
        ("fire_trucks".to_string(), 20.0),
        ("helicopters".to_string(), 5.0),
        ("water_tankers".to_string(), 10.0),
    ])
}

#[derive(Clone, Debug)]
pub enum Job {
    Load,
    Predict {
        area_id: u64,
        location: LatLng,
        weather: Weather,
    },
    Optimize {
        areas: Vec<RiskArea>,
        available: BTreeMap<String, f64>,
    },
    Detect(PathBuf),
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::Load => "load",
            Job::Predict { .. } => "predict",
            Job::Optimize { .. } => "optimize",
            Job::Detect(_) => "detect",
        }
    }
}

#[derive(Clone, Debug)]
pub enum JobResult {
    Loaded(Dataset, LoadOutcome),
    Predicted { area_id: u64, prediction: Prediction },
    Optimized(AllocationPlan),
    Detected(DetectionReport),
    Failed { job: &'static str, error: String },
}

/// Handle to the worker thread. Dropping it closes the job channel,
/// which ends the thread after its current job.
pub struct Worker {
    jobs: Sender<Job>,
    results: Receiver<JobResult>,
    _handle: JoinHandle<()>,
}

impl Worker {
    pub fn spawn<B: Backend>(backend: B) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel::<JobResult>();
        let handle = thread::spawn(move || run_jobs(backend, job_rx, result_tx));
        Self {
            jobs: job_tx,
            results: result_rx,
            _handle: handle,
        }
    }

    /// Queue a job; false if the worker has gone away
    pub fn submit(&self, job: Job) -> bool {
        info!(job = job.name(), "job.submitted");
        self.jobs.send(job).is_ok()
    }

    /// Next finished job, without blocking
    pub fn try_recv(&self) -> Option<JobResult> {
        self.results.try_recv().ok()
    }

    /// Block until the next result arrives
    pub fn recv(&self) -> Option<JobResult> {
        self.results.recv().ok()
    }
}

fn run_jobs<B: Backend>(backend: B, jobs: Receiver<Job>, results: Sender<JobResult>) {
    for job in jobs {
        let result = run_job(&backend, job);
        if results.send(result).is_err() {
            break;
        }
    }
}

fn run_job<B: Backend>(backend: &B, job: Job) -> JobResult {
    let name = job.name();
    let outcome = match job {
        Job::Load => {
            let (data, outcome) = fetch_or_sample(backend);
            return JobResult::Loaded(data, outcome);
        }
        Job::Predict {
            area_id,
            location,
            weather,
        } => backend
            .predict(location, weather)
            .map(|prediction| JobResult::Predicted { area_id, prediction }),
        Job::Optimize { areas, available } => backend
            .optimize(&areas, &available)
            .map(JobResult::Optimized),
        Job::Detect(path) => backend.detect(&path).map(JobResult::Detected),
    };
    outcome.unwrap_or_else(|err| {
        warn!(job = name, "job failed: {err}");
        JobResult::Failed {
            job: name,
            error: err.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned;

    impl DataSource for Canned {
        fn fetch(&self) -> Result<Dataset, ApiError> {
            let mut data = Dataset::sample();
            data.resources.clear();
            Ok(data)
        }
    }

    impl Backend for Canned {
        fn predict(&self, _location: LatLng, weather: Weather) -> Result<Prediction, ApiError> {
            Ok(Prediction {
                risk_score: weather.temperature / 100.0,
                risk_factors: vec!["High temperature".into()],
                timestamp: String::new(),
            })
        }

        fn optimize(
            &self,
            areas: &[RiskArea],
            _available: &BTreeMap<String, f64>,
        ) -> Result<AllocationPlan, ApiError> {
            Ok(AllocationPlan {
                recommendations: Vec::with_capacity(areas.len()),
                timestamp: String::new(),
            })
        }

        fn detect(&self, _image: &Path) -> Result<DetectionReport, ApiError> {
            Err(ApiError::Status {
                url: "canned/detect".into(),
                status: 500,
            })
        }
    }

    #[test]
    fn test_offline_load_falls_back_to_sample() {
        let worker = Worker::spawn(Offline);
        assert!(worker.submit(Job::Load));
        match worker.recv() {
            Some(JobResult::Loaded(data, LoadOutcome::Fallback)) => assert_eq!(data, Dataset::sample()),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_results_arrive_in_submission_order() {
        let worker = Worker::spawn(Canned);
        worker.submit(Job::Load);
        worker.submit(Job::Predict {
            area_id: 2,
            location: LatLng::new(34.0, -118.2),
            weather: Weather::default(),
        });
        worker.submit(Job::Detect(PathBuf::from("smoke.jpg")));

        assert!(matches!(worker.recv(), Some(JobResult::Loaded(ref d, LoadOutcome::Live)) if d.resources.is_empty()));
        match worker.recv() {
            Some(JobResult::Predicted { area_id, prediction }) => {
                assert_eq!(area_id, 2);
                assert_eq!(prediction.risk_score, 0.25);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(matches!(
            worker.recv(),
            Some(JobResult::Failed { job: "detect", .. })
        ));
    }

    #[test]
    fn test_offline_requests_fail_without_network() {
        let worker = Worker::spawn(Offline);
        worker.submit(Job::Optimize {
            areas: Dataset::sample().risk_areas,
            available: default_available_resources(),
        });
        match worker.recv() {
            Some(JobResult::Failed { job, error }) => {
                assert_eq!(job, "optimize");
                assert!(error.contains("network disabled"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
