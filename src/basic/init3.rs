//! INIT3 kernel.
//!
//! Reference loop:
//!
//! ```text
//! for i in 0..run_size {
//!     out1[i] = out2[i] = out3[i] = -in1[i] - in2[i];
//! }
//! ```
//!
//! Every variant computes this exact loop over the same seeded data; they
//! differ only in how the iteration space is executed.

use crate::forall::{self, ExecPolicy};
use crate::kernel::{Kernel, KernelBase, RunParams};
use crate::kernels::host;
use crate::suite::{variant_name, KernelId, VariantId};
use crate::utils::{calc_checksum, Real, SuiteFloat};

use std::mem::size_of;

#[cfg(feature = "cuda")]
use crate::{consts::GPU_BLOCK_SIZE, kernels::device::CUDA_INIT3};
#[cfg(feature = "cuda")]
use cust::function::{BlockSize, GridSize};
#[cfg(feature = "cuda")]
use cust::prelude::*;

#[cfg(feature = "opencl")]
use crate::kernels::device::CL_INIT3;
#[cfg(all(feature = "opencl", not(feature = "cuda")))]
use crate::consts::GPU_BLOCK_SIZE;
#[cfg(feature = "opencl")]
use ocl::ProQue;

/// Default problem size (elements per buffer).
const DEFAULT_SIZE: usize = 100_000;
/// Default repetition count for the timed loop.
const DEFAULT_REPS: usize = 5_000;

#[cfg(feature = "opencl")]
struct ClState {
    pro_que: ProQue,
    kernel: ocl::Kernel,
    d_out1: ocl::Buffer<Real>,
    d_out2: ocl::Buffer<Real>,
    d_out3: ocl::Buffer<Real>,
    d_in1: ocl::Buffer<Real>,
    d_in2: ocl::Buffer<Real>,
}

#[cfg(feature = "cuda")]
struct CudaState {
    module: Module,
    stream: Stream,
    d_out1: DeviceBuffer<Real>,
    d_out2: DeviceBuffer<Real>,
    d_out3: DeviceBuffer<Real>,
    d_in1: DeviceBuffer<Real>,
    d_in2: DeviceBuffer<Real>,
    // Declared last so it outlives the buffers and module on drop.
    _ctx: cust::context::Context,
}

/// INIT3 kernel instance: five equally sized buffers, owned exclusively for
/// the duration of one pass, plus the per-variant checksum and timing state
/// in [`KernelBase`].
pub struct Init3 {
    base: KernelBase,
    out1: Option<Vec<Real>>,
    out2: Option<Vec<Real>>,
    out3: Option<Vec<Real>>,
    in1: Option<Vec<Real>>,
    in2: Option<Vec<Real>>,
    #[cfg(feature = "opencl")]
    cl: Option<ClState>,
    #[cfg(feature = "cuda")]
    cuda: Option<CudaState>,
}

impl Init3 {
    pub fn new(params: &RunParams) -> Self {
        Self {
            base: KernelBase::new(KernelId::Init3, DEFAULT_SIZE, DEFAULT_REPS, params),
            out1: None,
            out2: None,
            out3: None,
            in1: None,
            in2: None,
            #[cfg(feature = "opencl")]
            cl: None,
            #[cfg(feature = "cuda")]
            cuda: None,
        }
    }

    /// Mutable views of the base state and the five host buffers.
    ///
    /// Panics if called before `set_up`; the driver guarantees the lifecycle
    /// order.
    fn host_views(
        &mut self,
    ) -> (
        &mut KernelBase,
        &mut [Real],
        &mut [Real],
        &mut [Real],
        &[Real],
        &[Real],
    ) {
        let Self {
            base,
            out1,
            out2,
            out3,
            in1,
            in2,
            ..
        } = self;
        (
            base,
            out1.as_mut().expect("INIT3 buffers not set up"),
            out2.as_mut().expect("INIT3 buffers not set up"),
            out3.as_mut().expect("INIT3 buffers not set up"),
            in1.as_deref().expect("INIT3 buffers not set up"),
            in2.as_deref().expect("INIT3 buffers not set up"),
        )
    }

    #[cfg(feature = "opencl")]
    fn build_cl_state(&self) -> ClState {
        let n = self.base.run_size();

        let pro_que = ProQue::builder()
            .src(CL_INIT3.source())
            .dims(n)
            .build()
            .expect("failed to build OpenCL program queue");

        let mirror = |buf: &Option<Vec<Real>>| {
            pro_que
                .buffer_builder()
                .copy_host_slice(buf.as_deref().expect("INIT3 buffers not set up"))
                .build()
                .expect("failed to create device buffer")
        };
        let d_out1 = mirror(&self.out1);
        let d_out2 = mirror(&self.out2);
        let d_out3 = mirror(&self.out3);
        let d_in1 = mirror(&self.in1);
        let d_in2 = mirror(&self.in2);

        let mut kernel = pro_que
            .kernel_builder(CL_INIT3.name())
            .arg(&d_out1)
            .arg(&d_out2)
            .arg(&d_out3)
            .arg(&d_in1)
            .arg(&d_in2)
            .build()
            .expect("failed to build OpenCL kernel");

        if n >= GPU_BLOCK_SIZE && n % GPU_BLOCK_SIZE == 0 {
            kernel.set_default_local_work_size(ocl::SpatialDims::One(GPU_BLOCK_SIZE));
        }

        ClState {
            pro_que,
            kernel,
            d_out1,
            d_out2,
            d_out3,
            d_in1,
            d_in2,
        }
    }

    #[cfg(feature = "cuda")]
    fn build_cuda_state(&self) -> CudaState {
        let ctx = cust::quick_init().expect("failed to initialize CUDA context");
        let module =
            Module::from_ptx(CUDA_INIT3.source(), &[]).expect("failed to load INIT3 PTX module");
        let stream =
            Stream::new(StreamFlags::NON_BLOCKING, None).expect("failed to create CUDA stream");

        let mirror = |buf: &Option<Vec<Real>>| {
            DeviceBuffer::from_slice(buf.as_deref().expect("INIT3 buffers not set up"))
                .expect("failed to create device buffer")
        };
        CudaState {
            module,
            stream,
            d_out1: mirror(&self.out1),
            d_out2: mirror(&self.out2),
            d_out3: mirror(&self.out3),
            d_in1: mirror(&self.in1),
            d_in2: mirror(&self.in2),
            _ctx: ctx,
        }
    }

    /// Copies the three device-resident output buffers back into the host
    /// buffers so the checksum step sees the device results.
    #[cfg(feature = "opencl")]
    fn read_back_cl(&mut self) {
        let Self {
            out1,
            out2,
            out3,
            cl,
            ..
        } = self;
        let cl = cl.as_ref().expect("OpenCL state not set up");
        let read = |d: &ocl::Buffer<Real>, h: &mut Option<Vec<Real>>| {
            d.read(h.as_deref_mut().expect("INIT3 buffers not set up"))
                .enq()
                .expect("failed to read back device buffer");
        };
        read(&cl.d_out1, out1);
        read(&cl.d_out2, out2);
        read(&cl.d_out3, out3);
    }

    #[cfg(feature = "cuda")]
    fn read_back_cuda(&mut self) {
        let Self {
            out1,
            out2,
            out3,
            cuda,
            ..
        } = self;
        let cuda = cuda.as_ref().expect("CUDA state not set up");
        let read = |d: &DeviceBuffer<Real>, h: &mut Option<Vec<Real>>| {
            d.copy_to(h.as_deref_mut().expect("INIT3 buffers not set up"))
                .expect("failed to copy device buffer back to host");
        };
        read(&cuda.d_out1, out1);
        read(&cuda.d_out2, out2);
        read(&cuda.d_out3, out3);
    }

    #[cfg(any(feature = "cuda", feature = "opencl"))]
    fn device_allocated_bytes(&self) -> usize {
        let mut elems = 0;
        #[cfg(feature = "opencl")]
        if let Some(cl) = &self.cl {
            elems += cl.d_out1.len()
                + cl.d_out2.len()
                + cl.d_out3.len()
                + cl.d_in1.len()
                + cl.d_in2.len();
        }
        #[cfg(feature = "cuda")]
        if let Some(cuda) = &self.cuda {
            elems += cuda.d_out1.len()
                + cuda.d_out2.len()
                + cuda.d_out3.len()
                + cuda.d_in1.len()
                + cuda.d_in2.len();
        }
        elems * size_of::<Real>()
    }

    #[cfg(not(any(feature = "cuda", feature = "opencl")))]
    fn device_allocated_bytes(&self) -> usize {
        0
    }
}

impl Kernel for Init3 {
    fn base(&self) -> &KernelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut KernelBase {
        &mut self.base
    }

    fn set_up(&mut self, vid: VariantId) {
        let n = self.base.run_size();
        let seed = self.base.seed();

        // Fresh, deterministically seeded data every pass so each variant
        // sees identical inputs.
        self.out1 = Some(Real::rand_vector(n, seed));
        self.out2 = Some(Real::rand_vector(n, seed.wrapping_add(1)));
        self.out3 = Some(Real::rand_vector(n, seed.wrapping_add(2)));
        self.in1 = Some(Real::rand_vector(n, seed.wrapping_add(3)));
        self.in2 = Some(Real::rand_vector(n, seed.wrapping_add(4)));

        match vid {
            #[cfg(feature = "opencl")]
            VariantId::BaseOpenCl | VariantId::ForallOpenCl => {
                self.cl = Some(self.build_cl_state());
            }
            #[cfg(feature = "cuda")]
            VariantId::BaseCuda | VariantId::ForallCuda => {
                self.cuda = Some(self.build_cuda_state());
            }
            _ => {}
        }
    }

    fn run(&mut self, vid: VariantId) {
        let reps = self.base.run_reps();

        match vid {
            VariantId::BaseSeq => {
                let (base, out1, out2, out3, in1, in2) = self.host_views();
                base.start_timer();
                for _ in 0..reps {
                    host::init3(out1, out2, out3, in1, in2);
                }
                base.stop_timer();
            }

            VariantId::ForallSimd => {
                let (base, out1, out2, out3, in1, in2) = self.host_views();
                base.start_timer();
                for _ in 0..reps {
                    forall::forall3(ExecPolicy::Simd, out1, out2, out3, in1, in2, |a, b| -a - b);
                }
                base.stop_timer();
            }

            VariantId::BaseThreads => {
                let (base, out1, out2, out3, in1, in2) = self.host_views();
                base.start_timer();
                for _ in 0..reps {
                    host::par_init3(out1, out2, out3, in1, in2);
                }
                base.stop_timer();
            }

            VariantId::ForallThreads => {
                let (base, out1, out2, out3, in1, in2) = self.host_views();
                base.start_timer();
                for _ in 0..reps {
                    forall::forall3(
                        ExecPolicy::Threads,
                        out1,
                        out2,
                        out3,
                        in1,
                        in2,
                        |a, b| -a - b,
                    );
                }
                base.stop_timer();
            }

            #[cfg(feature = "opencl")]
            VariantId::BaseOpenCl => {
                let cl = self.cl.as_ref().expect("OpenCL state not set up");
                self.base.start_timer();
                for _ in 0..reps {
                    unsafe {
                        cl.kernel.enq().expect("failed to enqueue INIT3 kernel");
                    }
                }
                cl.pro_que
                    .queue()
                    .finish()
                    .expect("failed to finish OpenCL queue");
                self.base.stop_timer();
                self.read_back_cl();
            }

            #[cfg(feature = "opencl")]
            VariantId::ForallOpenCl => {
                let n = self.base.run_size();
                let cl = self.cl.as_ref().expect("OpenCL state not set up");
                self.base.start_timer();
                for _ in 0..reps {
                    forall::opencl::forall(&cl.kernel, n)
                        .expect("failed to enqueue INIT3 kernel");
                }
                cl.pro_que
                    .queue()
                    .finish()
                    .expect("failed to finish OpenCL queue");
                self.base.stop_timer();
                self.read_back_cl();
            }

            #[cfg(feature = "cuda")]
            VariantId::BaseCuda => {
                let n = self.base.run_size();
                let cuda = self.cuda.as_ref().expect("CUDA state not set up");
                let func = cuda
                    .module
                    .get_function(CUDA_INIT3.name())
                    .expect("failed to get INIT3 function");
                let grid_size = GridSize::x(((n + GPU_BLOCK_SIZE - 1) / GPU_BLOCK_SIZE) as u32);
                let block_size = BlockSize::x(GPU_BLOCK_SIZE as u32);
                let stream = &cuda.stream;

                self.base.start_timer();
                for _ in 0..reps {
                    unsafe {
                        launch!(
                            func<<<grid_size, block_size, 0, stream>>>(
                                cuda.d_out1.as_device_ptr(),
                                cuda.d_out2.as_device_ptr(),
                                cuda.d_out3.as_device_ptr(),
                                cuda.d_in1.as_device_ptr(),
                                cuda.d_in2.as_device_ptr(),
                                n
                            )
                        )
                        .expect("failed to launch INIT3 kernel");
                    }
                }
                cuda.stream
                    .synchronize()
                    .expect("failed to synchronize INIT3 kernel");
                self.base.stop_timer();
                self.read_back_cuda();
            }

            #[cfg(feature = "cuda")]
            VariantId::ForallCuda => {
                let n = self.base.run_size();
                let cuda = self.cuda.as_ref().expect("CUDA state not set up");
                let func = cuda
                    .module
                    .get_function(CUDA_INIT3.name())
                    .expect("failed to get INIT3 function");

                self.base.start_timer();
                for _ in 0..reps {
                    forall::cuda::forall3(
                        &func,
                        &cuda.stream,
                        n,
                        &cuda.d_out1,
                        &cuda.d_out2,
                        &cuda.d_out3,
                        &cuda.d_in1,
                        &cuda.d_in2,
                    )
                    .expect("failed to launch INIT3 kernel");
                }
                cuda.stream
                    .synchronize()
                    .expect("failed to synchronize INIT3 kernel");
                self.base.stop_timer();
                self.read_back_cuda();
            }

            #[allow(unreachable_patterns)]
            _ => {
                eprintln!(
                    "\n  INIT3 : Unknown or unavailable variant = {}",
                    variant_name(vid)
                );
            }
        }
    }

    fn update_checksum(&mut self, vid: VariantId) {
        let Self {
            base,
            out1,
            out2,
            out3,
            ..
        } = self;
        for out in [&*out1, &*out2, &*out3] {
            if let Some(buf) = out {
                base.add_to_checksum(vid, calc_checksum(buf));
            }
        }
    }

    fn tear_down(&mut self, _vid: VariantId) {
        self.out1 = None;
        self.out2 = None;
        self.out3 = None;
        self.in1 = None;
        self.in2 = None;
        #[cfg(feature = "opencl")]
        {
            self.cl = None;
        }
        #[cfg(feature = "cuda")]
        {
            self.cuda = None;
        }
    }

    fn allocated_bytes(&self) -> usize {
        let host: usize = [&self.out1, &self.out2, &self.out3, &self.in1, &self.in2]
            .iter()
            .map(|buf| buf.as_ref().map_or(0, |v| v.len() * size_of::<Real>()))
            .sum();
        host + self.device_allocated_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn params(size: usize, reps: usize, seed: u64) -> RunParams {
        RunParams {
            size: Some(size),
            reps: Some(reps),
            seed: Some(seed),
        }
    }

    fn one_pass(kernel: &mut Init3, vid: VariantId) {
        kernel.set_up(vid);
        kernel.run(vid);
        kernel.update_checksum(vid);
        kernel.tear_down(vid);
    }

    #[test]
    fn host_variants_agree_on_checksum() {
        let variants = [
            VariantId::BaseSeq,
            VariantId::ForallSimd,
            VariantId::BaseThreads,
            VariantId::ForallThreads,
        ];
        let mut kernel = Init3::new(&params(1000, 3, 42));
        for vid in variants {
            one_pass(&mut kernel, vid);
        }
        let reference = kernel.base().checksum(VariantId::BaseSeq);
        assert_ne!(reference, 0.0);
        for vid in variants {
            assert_eq!(
                kernel.base().checksum(vid),
                reference,
                "variant {} diverged",
                variant_name(vid)
            );
        }
    }

    #[test]
    fn checksum_is_independent_of_rep_count() {
        let mut once = Init3::new(&params(512, 1, 7));
        let mut many = Init3::new(&params(512, 9, 7));
        one_pass(&mut once, VariantId::BaseSeq);
        one_pass(&mut many, VariantId::BaseSeq);
        assert_eq!(
            once.base().checksum(VariantId::BaseSeq),
            many.base().checksum(VariantId::BaseSeq)
        );
    }

    #[test]
    fn outputs_equal_minus_in1_minus_in2() {
        let mut kernel = Init3::new(&params(256, 2, 11));
        kernel.set_up(VariantId::BaseSeq);
        kernel.run(VariantId::BaseSeq);
        let in1 = kernel.in1.clone().unwrap();
        let in2 = kernel.in2.clone().unwrap();
        let out1 = kernel.out1.clone().unwrap();
        for i in 0..256 {
            assert_eq!(out1[i], -in1[i] - in2[i]);
        }
        assert_eq!(kernel.out1, kernel.out2);
        assert_eq!(kernel.out1, kernel.out3);
        kernel.tear_down(VariantId::BaseSeq);
    }

    #[test]
    fn tear_down_releases_all_buffers() {
        let mut kernel = Init3::new(&params(256, 1, 0));
        kernel.set_up(VariantId::BaseSeq);
        assert_eq!(kernel.allocated_bytes(), 5 * 256 * size_of::<Real>());
        kernel.run(VariantId::BaseSeq);
        kernel.tear_down(VariantId::BaseSeq);
        assert_eq!(kernel.allocated_bytes(), 0);
    }

    #[test]
    fn timer_brackets_only_the_run() {
        let mut kernel = Init3::new(&params(100_000, 5, 0));
        kernel.set_up(VariantId::BaseSeq);
        assert_eq!(kernel.base_mut().take_elapsed(), Duration::ZERO);
        kernel.run(VariantId::BaseSeq);
        assert!(kernel.base_mut().take_elapsed() > Duration::ZERO);
        kernel.tear_down(VariantId::BaseSeq);
        assert_eq!(kernel.base_mut().take_elapsed(), Duration::ZERO);
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn unavailable_variant_mutates_nothing() {
        let mut kernel = Init3::new(&params(64, 4, 3));
        kernel.set_up(VariantId::BaseCuda);
        let before = (
            kernel.out1.clone(),
            kernel.out2.clone(),
            kernel.out3.clone(),
        );
        kernel.run(VariantId::BaseCuda);
        assert_eq!(kernel.out1, before.0);
        assert_eq!(kernel.out2, before.1);
        assert_eq!(kernel.out3, before.2);
        kernel.tear_down(VariantId::BaseCuda);
        assert_eq!(kernel.allocated_bytes(), 0);
    }
}
