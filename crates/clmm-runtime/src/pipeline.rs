use std::{marker::PhantomData, sync::Arc, time::Instant};

use crate::{
    collector::ResultCollector,
    config::GlobalConfig,
    context::{ContextOptions, ExecutionContext},
    device::{DeviceLocator, DeviceProperties, DeviceSelection, LocatedDevice},
    dispatch::{Dispatcher, WorkDescriptor},
    error::PipelineError,
    kernel::{MatmulArgs, MATRIX_MULTI_SIGNATURE},
    logging::PipelineLogger,
    matrix::{Matrix, MatrixShape, ShapeError},
    memory::{AccessMode, BufferManager},
    program::ProgramImage,
    runtime::Runtime,
};

/// Dimensions of `D = A * B + C` with A of `m x n` and B of `n x p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatmulProblem {
    /// Rows of A, C and D.
    pub m: usize,
    /// Columns of A and rows of B.
    pub n: usize,
    /// Columns of B, C and D.
    pub p: usize,
}

impl Default for MatmulProblem {
    fn default() -> Self {
        Self {
            m: 200,
            n: 400,
            p: 600,
        }
    }
}

impl MatmulProblem {
    /// Create a problem, rejecting zero dimensions.
    pub fn new(m: usize, n: usize, p: usize) -> Result<Self, ShapeError> {
        for (name, value) in [("m", m), ("n", n), ("p", p)] {
            if value == 0 {
                return Err(ShapeError::ZeroDimension { name });
            }
        }

        Ok(Self { m, n, p })
    }

    /// Shape of the output D.
    pub fn output_shape(&self) -> MatrixShape {
        MatrixShape::new(self.p, self.m)
    }

    /// Inputs with A filled with 1, B with 2 and C with 3.
    pub fn inputs(&self) -> Result<MatmulInputs, ShapeError> {
        MatmulInputs::new(
            Matrix::filled(MatrixShape::new(self.n, self.m), 1.0)?,
            Matrix::filled(MatrixShape::new(self.p, self.n), 2.0)?,
            Matrix::filled(self.output_shape(), 3.0)?,
        )
    }
}

/// Operands of `D = A * B + C`, with shapes that chain.
#[derive(Debug, Clone, PartialEq)]
pub struct MatmulInputs {
    a: Matrix,
    b: Matrix,
    c: Matrix,
}

impl MatmulInputs {
    /// Check that `A.width == B.height` and that C is shaped like the output.
    pub fn new(a: Matrix, b: Matrix, c: Matrix) -> Result<Self, ShapeError> {
        for (name, matrix) in [("a", &a), ("b", &b), ("c", &c)] {
            if matrix.shape().is_empty() {
                return Err(ShapeError::ZeroDimension { name });
            }
        }

        if a.width() != b.height() {
            return Err(ShapeError::ChainMismatch {
                name: "b",
                expected: MatrixShape::new(b.width(), a.width()),
                got: b.shape(),
            });
        }

        let output = MatrixShape::new(b.width(), a.height());
        if c.shape() != output {
            return Err(ShapeError::ChainMismatch {
                name: "c",
                expected: output,
                got: c.shape(),
            });
        }

        Ok(Self { a, b, c })
    }

    /// Left operand.
    pub fn a(&self) -> &Matrix {
        &self.a
    }

    /// Right operand.
    pub fn b(&self) -> &Matrix {
        &self.b
    }

    /// Addend.
    pub fn c(&self) -> &Matrix {
        &self.c
    }

    /// Shape of the output D.
    pub fn output_shape(&self) -> MatrixShape {
        self.c.shape()
    }
}

/// Result of a dispatch.
#[derive(Debug, Clone)]
pub struct MatmulOutput {
    /// The output D.
    pub matrix: Matrix,
    /// Properties of the device that computed it, if they could be queried.
    pub device: Option<DeviceProperties>,
}

impl MatmulOutput {
    /// The first row of the output.
    pub fn first_row(&self) -> &[f32] {
        self.matrix.row(0).unwrap_or_default()
    }
}

/// Runs `simpleMultiply` on one device, from device selection to readback.
#[derive(Debug)]
pub struct MatmulPipeline<R: Runtime> {
    config: Arc<GlobalConfig>,
    _runtime: PhantomData<R>,
}

impl<R: Runtime> MatmulPipeline<R> {
    /// Create a pipeline with the given configuration.
    pub fn new(config: Arc<GlobalConfig>) -> Self {
        Self {
            config,
            _runtime: PhantomData,
        }
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Find the device for the selection.
    pub fn locate(&self, selection: DeviceSelection) -> Result<LocatedDevice<R>, PipelineError> {
        let locator = DeviceLocator::new(self.config.device.clone());
        Ok(locator.locate::<R>(selection)?)
    }

    /// Locate a device, then run on it.
    pub fn run(
        &self,
        selection: DeviceSelection,
        inputs: &MatmulInputs,
    ) -> Result<MatmulOutput, PipelineError> {
        let located = self.locate(selection)?;
        self.run_on(&located, inputs)
    }

    /// Find the program image for the device, then run on it.
    pub fn run_on(
        &self,
        located: &LocatedDevice<R>,
        inputs: &MatmulInputs,
    ) -> Result<MatmulOutput, PipelineError> {
        let device_name = match R::device_properties(&located.device) {
            Ok(properties) => properties.name,
            Err(err) => {
                log::warn!("Can't query the device name, board images won't be searched: {err}");
                String::new()
            }
        };

        let image = ProgramImage::locate(&self.config.program, &device_name)?;
        self.execute(located, &image, inputs)
    }

    /// Upload the inputs, run the compute unit and read the output back.
    ///
    /// Buffers and driver handles are released before returning, on success or failure.
    pub fn execute(
        &self,
        located: &LocatedDevice<R>,
        image: &ProgramImage,
        inputs: &MatmulInputs,
    ) -> Result<MatmulOutput, PipelineError> {
        let mut logger = PipelineLogger::new(&self.config);
        let options = ContextOptions::from_config(&self.config);

        let start = Instant::now();
        let mut context = ExecutionContext::<R>::open(located.device.clone(), image, &options)?;
        logger.register_stage("open context", start.elapsed());
        logger.log_basic("Kernel initialization is complete.");

        let start = Instant::now();
        let mut buffers = BufferManager::<R>::new();
        let a = buffers.upload(&context, inputs.a(), AccessMode::ReadOnly)?;
        let b = buffers.upload(&context, inputs.b(), AccessMode::ReadOnly)?;
        let c = buffers.upload(&context, inputs.c(), AccessMode::ReadOnly)?;
        let d = buffers.allocate(&context, inputs.output_shape(), AccessMode::WriteOnly)?;
        logger.register_stage("upload", start.elapsed());
        logger.log_full(format!(
            "Buffers: A {}, B {}, C {}, D {}",
            a.shape, b.shape, c.shape, d.shape
        ));

        let start = Instant::now();
        let args = MatmulArgs::new(d, a, b, c).to_args()?;
        let mut dispatcher = Dispatcher::new(&context, MATRIX_MULTI_SIGNATURE);
        dispatcher.bind(&buffers, &args)?;

        let work =
            WorkDescriptor::for_output(inputs.output_shape(), self.config.dispatch.local_size);
        logger.log_basic("Launching the kernel...");
        logger.log_full(format!(
            "Work descriptor: global {} local {}",
            work.global, work.local
        ));
        dispatcher.launch(&work)?;

        let collector = ResultCollector::new(&context);
        collector.wait()?;
        logger.register_stage("kernel", start.elapsed());
        logger.log_basic("Kernel execution is complete.");

        let start = Instant::now();
        let mut output = Matrix::zeros(inputs.output_shape())?;
        collector.collect(&buffers, d, &mut output)?;
        logger.register_stage("readback", start.elapsed());

        buffers.release_all();
        context.close();
        logger.stage_summary();

        Ok(MatmulOutput {
            matrix: output,
            device: context.properties().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn default_problem_is_the_reference_run() {
        let problem = MatmulProblem::default();
        let inputs = problem.inputs().unwrap();

        assert_eq!(inputs.a().shape(), MatrixShape::new(400, 200));
        assert_eq!(inputs.b().shape(), MatrixShape::new(600, 400));
        assert_eq!(inputs.output_shape(), MatrixShape::new(600, 200));
        assert!(inputs.c().data().iter().all(|v| *v == 3.0));
    }

    #[test_log::test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            MatmulProblem::new(2, 0, 2),
            Err(ShapeError::ZeroDimension { name: "n" })
        );
    }

    #[test_log::test]
    fn inputs_must_chain() {
        let a = Matrix::filled(MatrixShape::new(3, 2), 1.0).unwrap();
        let b = Matrix::filled(MatrixShape::new(4, 2), 2.0).unwrap();
        let c = Matrix::filled(MatrixShape::new(4, 2), 3.0).unwrap();

        let err = MatmulInputs::new(a, b, c).unwrap_err();

        assert_eq!(
            err,
            ShapeError::ChainMismatch {
                name: "b",
                expected: MatrixShape::new(4, 3),
                got: MatrixShape::new(4, 2)
            }
        );
    }

    #[test_log::test]
    fn addend_must_match_the_output() {
        let a = Matrix::filled(MatrixShape::new(3, 2), 1.0).unwrap();
        let b = Matrix::filled(MatrixShape::new(4, 3), 2.0).unwrap();
        let c = Matrix::filled(MatrixShape::new(2, 4), 3.0).unwrap();

        assert!(matches!(
            MatmulInputs::new(a, b, c),
            Err(ShapeError::ChainMismatch { name: "c", .. })
        ));
    }
}
