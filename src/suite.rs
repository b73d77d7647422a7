//! Suite registry: kernel/variant identifiers, their name tables and the
//! kernel factory.
//!
//! The registry is intentionally flat: enums for the group, kernel and
//! variant identifiers, parallel static name tables indexed by enum value,
//! and a factory that constructs a fresh kernel object for a given id and run
//! configuration. Unknown names yield `None` and a diagnostic on `stderr`,
//! never a panic.

use crate::basic;
use crate::kernel::{Kernel, RunParams};

use std::fmt;

pub const NUM_GROUPS: usize = 1;
pub const NUM_KERNELS: usize = 1;
pub const NUM_VARIANTS: usize = 8;

/// Kernel groups in the suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupId {
    Basic,
}

/// Kernels in the suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelId {
    Init3,
}

/// Execution-backend variants a kernel can run under.
///
/// Backends come in Base/Forall pairs: the `Base` variant spells the loop or
/// launch out by hand, the `Forall` variant routes the same body through the
/// portable [`crate::forall`] layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariantId {
    BaseSeq,
    ForallSimd,
    BaseThreads,
    ForallThreads,
    BaseOpenCl,
    ForallOpenCl,
    BaseCuda,
    ForallCuda,
}

// The name tables below are indexed by enum value and must be kept
// one-to-one with the enums above.

static GROUP_NAMES: [&str; NUM_GROUPS] = ["Basic"];

static KERNEL_NAMES: [&str; NUM_KERNELS] = ["Basic_INIT3"];

static VARIANT_NAMES: [&str; NUM_VARIANTS] = [
    "Base_Seq",
    "Forall_SIMD",
    "Base_Threads",
    "Forall_Threads",
    "Base_OpenCL",
    "Forall_OpenCL",
    "Base_CUDA",
    "Forall_CUDA",
];

impl KernelId {
    pub const ALL: [KernelId; NUM_KERNELS] = [KernelId::Init3];

    /// Group this kernel belongs to.
    pub fn group(self) -> GroupId {
        match self {
            KernelId::Init3 => GroupId::Basic,
        }
    }
}

impl VariantId {
    pub const ALL: [VariantId; NUM_VARIANTS] = [
        VariantId::BaseSeq,
        VariantId::ForallSimd,
        VariantId::BaseThreads,
        VariantId::ForallThreads,
        VariantId::BaseOpenCl,
        VariantId::ForallOpenCl,
        VariantId::BaseCuda,
        VariantId::ForallCuda,
    ];

    /// Whether this variant executes on a device rather than the host.
    pub fn is_device(self) -> bool {
        matches!(
            self,
            VariantId::BaseOpenCl
                | VariantId::ForallOpenCl
                | VariantId::BaseCuda
                | VariantId::ForallCuda
        )
    }
}

/// Returns the group name associated with a `GroupId` value.
pub fn group_name(gid: GroupId) -> &'static str {
    GROUP_NAMES[gid as usize]
}

/// Returns the full kernel name (group prefix included) associated with a
/// `KernelId` value.
pub fn full_kernel_name(kid: KernelId) -> &'static str {
    KERNEL_NAMES[kid as usize]
}

/// Returns the kernel name without its group prefix.
pub fn kernel_name(kid: KernelId) -> &'static str {
    let full = full_kernel_name(kid);
    full.split_once('_').map_or(full, |(_, name)| name)
}

/// Returns the variant name associated with a `VariantId` value.
pub fn variant_name(vid: VariantId) -> &'static str {
    VARIANT_NAMES[vid as usize]
}

/// Looks a kernel up by its full or short name, case-insensitively.
pub fn kernel_id_for_name(name: &str) -> Option<KernelId> {
    KernelId::ALL.into_iter().find(|&kid| {
        full_kernel_name(kid).eq_ignore_ascii_case(name)
            || kernel_name(kid).eq_ignore_ascii_case(name)
    })
}

/// Looks a variant up by name, case-insensitively.
pub fn variant_id_for_name(name: &str) -> Option<VariantId> {
    VariantId::ALL
        .into_iter()
        .find(|&vid| variant_name(vid).eq_ignore_ascii_case(name))
}

/// Whether the variant's execution backend is compiled into this build.
pub fn variant_available(vid: VariantId) -> bool {
    match vid {
        VariantId::BaseSeq
        | VariantId::ForallSimd
        | VariantId::BaseThreads
        | VariantId::ForallThreads => true,
        VariantId::BaseOpenCl | VariantId::ForallOpenCl => cfg!(feature = "opencl"),
        VariantId::BaseCuda | VariantId::ForallCuda => cfg!(feature = "cuda"),
    }
}

/// Constructs a fresh kernel object for the given kernel id and run
/// configuration.
pub fn kernel_for_id(kid: KernelId, params: &RunParams) -> Box<dyn Kernel> {
    match kid {
        KernelId::Init3 => Box::new(basic::Init3::new(params)),
    }
}

/// Constructs a fresh kernel object for the given kernel name. Unknown names
/// yield `None` and a diagnostic message, not a panic.
pub fn kernel_for_name(name: &str, params: &RunParams) -> Option<Box<dyn Kernel>> {
    match kernel_id_for_name(name) {
        Some(kid) => Some(kernel_for_id(kid, params)),
        None => {
            eprintln!("\n Unknown kernel name = {name}");
            None
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", group_name(*self))
    }
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", kernel_name(*self))
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", variant_name(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names_round_trip() {
        for vid in VariantId::ALL {
            assert_eq!(variant_id_for_name(variant_name(vid)), Some(vid));
        }
        assert_eq!(variant_id_for_name("base_seq"), Some(VariantId::BaseSeq));
        assert_eq!(variant_id_for_name("Base_Vulkan"), None);
    }

    #[test]
    fn kernel_names_round_trip() {
        for kid in KernelId::ALL {
            assert_eq!(kernel_id_for_name(full_kernel_name(kid)), Some(kid));
            assert_eq!(kernel_id_for_name(kernel_name(kid)), Some(kid));
        }
        assert_eq!(kernel_id_for_name("init3"), Some(KernelId::Init3));
        assert_eq!(kernel_id_for_name("DAXPY"), None);
    }

    #[test]
    fn factory_applies_run_params() {
        let params = RunParams {
            size: Some(1234),
            reps: None,
            seed: None,
        };
        let kernel = kernel_for_name("INIT3", &params).expect("known kernel");
        assert_eq!(kernel.base().kernel_id(), KernelId::Init3);
        assert_eq!(kernel.base().run_size(), 1234);
        // Unspecified reps fall back to the kernel descriptor's default.
        assert_eq!(kernel.base().run_reps(), 5000);
    }

    #[test]
    fn unknown_kernel_name_yields_none() {
        assert!(kernel_for_name("NOSUCHKERNEL", &RunParams::default()).is_none());
    }

    #[test]
    fn host_variants_are_always_available() {
        for vid in VariantId::ALL {
            if !vid.is_device() {
                assert!(variant_available(vid));
            }
        }
    }
}
