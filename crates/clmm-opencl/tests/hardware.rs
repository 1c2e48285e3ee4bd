//! Tests that need an OpenCL driver. Run with `--ignored` on a machine with the Intel FPGA
//! runtime installed and `CLMM_PROGRAM_DIR` pointing at the compiled `matrix_multi` images.

use std::sync::Arc;

use clmm_opencl::OpenClRuntime;
use clmm_runtime::{DeviceSelection, GlobalConfig, MatmulPipeline, MatmulProblem, Runtime};
use pretty_assertions::assert_eq;

#[test_log::test]
#[ignore = "requires an OpenCL platform"]
fn every_device_reports_its_properties() {
    for platform in OpenClRuntime::platforms().unwrap() {
        let properties = OpenClRuntime::platform_properties(&platform).unwrap();
        log::info!("\n{properties}");

        for device in OpenClRuntime::devices(&platform).unwrap() {
            let properties = OpenClRuntime::device_properties(&device).unwrap();
            log::info!("\n{properties}");

            assert!(properties.max_work_group_size > 0);
            assert!(properties.max_mem_alloc_size > 0);
        }
    }
}

#[test_log::test]
#[ignore = "requires the FPGA emulator and a compiled program image"]
fn emulator_reference_run() {
    let config = Arc::new(GlobalConfig::default().override_from_env());
    let pipeline = MatmulPipeline::<OpenClRuntime>::new(config);
    let problem = MatmulProblem::new(8, 6, 4).unwrap();

    let output = pipeline
        .run(DeviceSelection::Emulated, &problem.inputs().unwrap())
        .unwrap();

    assert_eq!(output.matrix.shape(), problem.output_shape());
    assert!(output.matrix.data().iter().all(|value| *value == 15.0));
}
