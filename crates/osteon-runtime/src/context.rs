//! The runtime context: committed backend, precision, and kernel dispatch.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use osteon_types::{OsteonError, OsteonResult};

use crate::backend::{default_probes, BackendKind, BackendProbe, BackendRequest, Precision, ProbeOutcome};
use crate::cancel::CancelToken;

/// Runtime configuration supplied by the orchestration layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Worker threads for data-parallel kernels. `None` uses all cores.
    pub threads: Option<usize>,
}

/// Read-only compute context shared by every solver and scene.
///
/// Cloning is cheap: the thread pool and cancel flag are shared.
#[derive(Clone)]
pub struct RuntimeContext {
    backend: BackendKind,
    precision: Precision,
    requested: BackendRequest,
    probes: Vec<ProbeOutcome>,
    /// `None` dispatches on the global rayon pool.
    pool: Option<Arc<rayon::ThreadPool>>,
    cancel: CancelToken,
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("backend", &self.backend)
            .field("precision", &self.precision)
            .field("requested", &self.requested)
            .field("threads", &self.threads())
            .finish()
    }
}

impl RuntimeContext {
    /// Probe the built-in backends and commit to the first that initializes.
    pub fn init(
        requested: BackendRequest,
        precision: Precision,
        config: &RuntimeConfig,
    ) -> OsteonResult<Self> {
        let probes = default_probes();
        Self::init_with_probes(requested, precision, config, &probes)
    }

    /// Same as [`RuntimeContext::init`] with caller-supplied probes.
    ///
    /// Probes are consulted in backend priority order; a missing probe for a
    /// kind counts as unavailable. CPU is always committed as the last resort
    /// even when no CPU probe is supplied.
    pub fn init_with_probes(
        requested: BackendRequest,
        precision: Precision,
        config: &RuntimeConfig,
        probes: &[Box<dyn BackendProbe>],
    ) -> OsteonResult<Self> {
        let mut outcomes = Vec::new();
        let mut committed = None;

        for kind in requested.candidates() {
            let outcome = match probes.iter().find(|p| p.kind() == kind) {
                Some(probe) => match probe.probe() {
                    Ok(detail) => ProbeOutcome { backend: kind, available: true, detail },
                    Err(detail) => ProbeOutcome { backend: kind, available: false, detail },
                },
                None => ProbeOutcome {
                    backend: kind,
                    available: false,
                    detail: "no probe registered".into(),
                },
            };
            let available = outcome.available;
            outcomes.push(outcome);
            if available {
                committed = Some(kind);
                break;
            }
        }

        let backend = match committed {
            Some(kind) => kind,
            None => {
                outcomes.push(ProbeOutcome {
                    backend: BackendKind::Cpu,
                    available: true,
                    detail: "implicit host fallback".into(),
                });
                BackendKind::Cpu
            }
        };

        if let BackendRequest::Prefer(kind) = requested {
            if kind != backend {
                warn!(requested = kind.name(), committed = backend.name(), "requested backend unavailable, falling back");
            }
        }

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = config.threads {
            if threads == 0 {
                return Err(OsteonError::InvalidConfig("runtime threads must be >= 1".into()));
            }
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| OsteonError::Backend(format!("thread pool build failed: {e}")))?;

        info!(
            backend = backend.name(),
            precision = ?precision,
            threads = pool.current_num_threads(),
            "runtime committed"
        );

        Ok(Self {
            backend,
            precision,
            requested,
            probes: outcomes,
            pool: Some(Arc::new(pool)),
            cancel: CancelToken::new(),
        })
    }

    /// CPU, double precision, global thread pool. Convenient for tests and tools.
    pub fn cpu() -> Self {
        Self {
            backend: BackendKind::Cpu,
            precision: Precision::Double,
            requested: BackendRequest::Prefer(BackendKind::Cpu),
            probes: vec![ProbeOutcome {
                backend: BackendKind::Cpu,
                available: true,
                detail: "host cpu".into(),
            }],
            pool: None,
            cancel: CancelToken::new(),
        }
    }

    /// Committed backend.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Committed precision.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// What the caller originally asked for.
    pub fn requested(&self) -> BackendRequest {
        self.requested
    }

    /// True when the committed backend differs from an explicit request.
    pub fn fell_back(&self) -> bool {
        match self.requested {
            BackendRequest::Auto => false,
            BackendRequest::Prefer(kind) => kind != self.backend,
        }
    }

    /// Probe outcomes in the order they were attempted.
    pub fn probe_report(&self) -> &[ProbeOutcome] {
        &self.probes
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Shared cancellation token.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Ordered data-parallel map over `0..n`.
    ///
    /// Each invocation of `f` owns its index; outputs are collected in index
    /// order, so the result is independent of scheduling.
    pub fn map_points<T, F>(&self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        self.install(|| (0..n).into_par_iter().map(f).collect())
    }

    /// Parallel in-place update of a slice, one element per invocation.
    pub fn for_each_mut<T, F>(&self, data: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        self.install(|| {
            data.par_iter_mut().enumerate().for_each(|(i, v)| f(i, v));
        });
    }

    /// Round a value to the committed precision.
    #[inline]
    pub fn quantize(&self, value: f64) -> f64 {
        match self.precision {
            Precision::Double => value,
            Precision::Single => value as f32 as f64,
        }
    }

    /// Round every value of a slice to the committed precision.
    pub fn quantize_slice(&self, values: &mut [f64]) {
        if self.precision == Precision::Single {
            self.for_each_mut(values, |_, v| *v = *v as f32 as f64);
        }
    }
}
