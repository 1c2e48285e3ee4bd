use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};

use clap::{ArgAction, Parser};
use clmm::{
    config::{LoggerConfig, PipelineLogLevel},
    opencl::OpenClRuntime,
    DeviceSelection, GlobalConfig, LocatedDevice, MatmulOutput, MatmulPipeline, MatmulProblem,
    PipelineError, ProgramImage, Runtime,
};

/// Computes `D = A * B + C` on an OpenCL accelerator.
#[derive(Parser, Debug)]
#[command(name = "clmm", version, about)]
struct Cli {
    /// Rows of `A`.
    #[arg(short = 'm', default_value = "200")]
    m: NonZeroUsize,

    /// Columns of `A` and rows of `B`.
    #[arg(short = 'n', default_value = "400")]
    n: NonZeroUsize,

    /// Columns of `B`.
    #[arg(short = 'p', default_value = "600")]
    p: NonZeroUsize,

    /// Run on the FPGA emulator platform instead of the board.
    #[arg(
        long,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    emulator: bool,

    /// Read the configuration from this file instead of `clmm.toml`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Don't print the pipeline milestones when the configuration leaves the logger disabled.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match GlobalConfig::from_file_path(path) {
            Ok(config) => config.override_from_env(),
            Err(err) => {
                eprintln!("ERROR: configuration failed: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => GlobalConfig::load(),
    };
    if !cli.quiet {
        print_milestones(&mut config.logger);
    }
    GlobalConfig::set(config);

    match run(&cli) {
        Ok(output) => {
            for value in output.first_row() {
                print!("{value:.6} ");
            }
            println!();
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ERROR: {} failed: {err}", err.stage());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<MatmulOutput, PipelineError> {
    let problem = MatmulProblem::new(cli.m.get(), cli.n.get(), cli.p.get())?;
    let inputs = problem.inputs()?;

    let pipeline = MatmulPipeline::<OpenClRuntime>::new(GlobalConfig::get());
    let located = pipeline.locate(DeviceSelection::from_emulator_flag(cli.emulator))?;

    let config = pipeline.config();
    let device_name = describe(&located, config.device.print_info);
    let image = ProgramImage::locate(&config.program, &device_name)?;
    println!("Using AOCX: {}", image.path.display());

    pipeline.execute(&located, &image, &inputs)
}

/// Send the pipeline milestones to stdout unless the logger was configured.
fn print_milestones(logger: &mut LoggerConfig<PipelineLogLevel>) {
    if logger.level == PipelineLogLevel::Disabled {
        logger.level = PipelineLogLevel::Basic;
        logger.stdout = true;
    }
}

/// Print what the driver reports about the located device and return its name.
fn describe<R: Runtime>(located: &LocatedDevice<R>, print_info: bool) -> String {
    if print_info {
        println!("Querying platform for info:");
        println!("==========================");
        match R::platform_properties(&located.platform) {
            Ok(properties) => println!("{properties}\n"),
            Err(err) => log::warn!("Can't query the platform: {err}"),
        }
    }

    match R::device_properties(&located.device) {
        Ok(properties) => {
            if print_info {
                println!("Querying device for info:");
                println!("========================");
                println!("{properties}\n");
            }
            properties.name
        }
        Err(err) => {
            log::warn!("Can't query the device, board images won't be searched: {err}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_reference_problem() {
        let cli = Cli::try_parse_from(["clmm"]).unwrap();

        assert_eq!((cli.m.get(), cli.n.get(), cli.p.get()), (200, 400, 600));
        assert!(!cli.emulator);
        assert!(cli.config.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn milestones_are_printed_by_default() {
        let mut logger = GlobalConfig::default().logger;

        print_milestones(&mut logger);

        assert_eq!(logger.level, PipelineLogLevel::Basic);
        assert!(logger.stdout);
    }

    #[test]
    fn configured_logger_is_kept() {
        let mut logger = GlobalConfig::default().logger;
        logger.level = PipelineLogLevel::Full;
        logger.file = Some(PathBuf::from("/tmp/clmm.log"));

        print_milestones(&mut logger);

        assert_eq!(logger.level, PipelineLogLevel::Full);
        assert!(!logger.stdout);
    }

    #[test]
    fn emulator_flag_accepts_a_bare_switch_or_a_value() {
        let bare = Cli::try_parse_from(["clmm", "--emulator"]).unwrap();
        let explicit = Cli::try_parse_from(["clmm", "--emulator", "false"]).unwrap();

        assert!(bare.emulator);
        assert!(!explicit.emulator);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(Cli::try_parse_from(["clmm", "-m", "0"]).is_err());
        assert!(Cli::try_parse_from(["clmm", "-n", "3", "-p", "0"]).is_err());
    }

    #[test]
    fn dimensions_are_parsed() {
        let cli = Cli::try_parse_from(["clmm", "-m", "8", "-n", "6", "-p", "4"]).unwrap();

        assert_eq!((cli.m.get(), cli.n.get(), cli.p.get()), (8, 6, 4));
    }
}
