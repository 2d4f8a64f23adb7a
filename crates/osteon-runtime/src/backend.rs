//! Backend kinds, precision, and availability probes.
//!
//! The [`BackendProbe`] trait is the seam between the runtime and device
//! drivers. The built-in GPU probes report unavailability when the build
//! carries no device kernels; that is a normal, reportable outcome and
//! never an error.

use serde::{Deserialize, Serialize};

/// Parallel execution backend, in probe priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Discrete GPU, CUDA family.
    Cuda,
    /// Discrete GPU, Metal family.
    Metal,
    /// Host CPU thread pool. Always available.
    Cpu,
}

impl BackendKind {
    /// All backends in fixed probe priority order.
    pub fn priority_order() -> &'static [BackendKind] {
        &[BackendKind::Cuda, BackendKind::Metal, BackendKind::Cpu]
    }

    /// Returns the backend name.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Cuda => "cuda",
            BackendKind::Metal => "metal",
            BackendKind::Cpu => "cpu",
        }
    }

    /// True for GPU backends.
    pub fn is_gpu(&self) -> bool {
        !matches!(self, BackendKind::Cpu)
    }
}

/// What the caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendRequest {
    /// Probe everything in priority order.
    #[default]
    Auto,
    /// Start probing at this backend, then continue down the priority order.
    Prefer(BackendKind),
}

impl BackendRequest {
    /// Backends to probe for this request, in order.
    pub fn candidates(&self) -> Vec<BackendKind> {
        let order = BackendKind::priority_order();
        match self {
            BackendRequest::Auto => order.to_vec(),
            BackendRequest::Prefer(kind) => order.iter().copied().filter(|k| k >= kind).collect(),
        }
    }
}

/// Numeric precision for state written back by the adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Values are rounded through `f32` on write-back.
    Single,
    /// Full `f64`.
    #[default]
    Double,
}

/// Result of probing one backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Backend probed.
    pub backend: BackendKind,
    /// Whether it initialized.
    pub available: bool,
    /// Device description or the reason it is unavailable.
    pub detail: String,
}

/// Trait for backend availability probes.
///
/// Probes must not panic; absence of a device is reported through `Err`.
pub trait BackendProbe: Send + Sync {
    /// Backend this probe initializes.
    fn kind(&self) -> BackendKind;

    /// Try to initialize the backend. Returns a device description on success.
    fn probe(&self) -> Result<String, String>;
}

/// CUDA probe. This build ships no CUDA kernels.
pub struct CudaProbe;

impl BackendProbe for CudaProbe {
    fn kind(&self) -> BackendKind {
        BackendKind::Cuda
    }

    fn probe(&self) -> Result<String, String> {
        Err("no CUDA kernels compiled into this build".into())
    }
}

/// Metal probe. This build ships no Metal kernels.
pub struct MetalProbe;

impl BackendProbe for MetalProbe {
    fn kind(&self) -> BackendKind {
        BackendKind::Metal
    }

    fn probe(&self) -> Result<String, String> {
        Err("no Metal kernels compiled into this build".into())
    }
}

/// CPU probe — always succeeds.
pub struct CpuProbe;

impl BackendProbe for CpuProbe {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn probe(&self) -> Result<String, String> {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Ok(format!("host cpu, {threads} hardware threads"))
    }
}

/// The built-in probes, one per backend kind.
pub fn default_probes() -> Vec<Box<dyn BackendProbe>> {
    vec![Box::new(CudaProbe), Box::new(MetalProbe), Box::new(CpuProbe)]
}
