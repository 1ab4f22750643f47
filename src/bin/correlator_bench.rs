use std::time::Instant;

use fx_correlator_harness::{
    compact_padded_output, compare, dump_samples, generate, generate_and_correlate_dense,
    generate_and_correlate_triangle, print_comparison_summary, print_kernel_parameters,
    print_reference_timing, print_run_banner, print_throughput, print_unverified_notice,
    tile_to_dense, tile_to_triangle, triangle_with_frequency_padding, Convention,
    CorrelatorBackend, CorrelatorPipeline, GeneratorMode, HarnessError, KernelVariant,
    MatrixLayout, RunConfig, SoftwareBackend,
};

#[derive(Debug, Clone)]
struct BenchConfig {
    run: RunConfig,
    /// Timesteps of the generated window to print before the run; 0
    /// prints nothing.
    dump_timesteps: usize,
}

fn next_arg(args: &[String], idx: &mut usize, flag: &str) -> Result<String, String> {
    *idx += 1;
    if *idx >= args.len() {
        return Err(format!("{} requires a value", flag));
    }
    Ok(args[*idx].clone())
}

fn parse_usize_flag(value: &str, flag: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|e| format!("{} invalid integer '{}': {}", flag, value, e))
}

fn parse_i32_flag(value: &str, flag: &str) -> Result<i32, String> {
    value
        .parse::<i32>()
        .map_err(|e| format!("{} invalid integer '{}': {}", flag, value, e))
}

fn parse_u32_flag(value: &str, flag: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|e| format!("{} invalid integer '{}': {}", flag, value, e))
}

fn parse_args() -> Result<BenchConfig, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut run = RunConfig::default();
    let mut dump_timesteps = 0usize;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--iterations" => {
                run.iterations =
                    parse_usize_flag(&next_arg(&args, &mut idx, "--iterations")?, "--iterations")?;
            }
            "--timesamples" => {
                run.num_timesamples = parse_usize_flag(
                    &next_arg(&args, &mut idx, "--timesamples")?,
                    "--timesamples",
                )?;
            }
            "--elements" => {
                run.num_elements =
                    parse_usize_flag(&next_arg(&args, &mut idx, "--elements")?, "--elements")?;
            }
            "--frequencies" => {
                run.num_frequencies = parse_usize_flag(
                    &next_arg(&args, &mut idx, "--frequencies")?,
                    "--frequencies",
                )?;
            }
            "--kernel-variant" => {
                run.kernel_variant = KernelVariant::parse(parse_u32_flag(
                    &next_arg(&args, &mut idx, "--kernel-variant")?,
                    "--kernel-variant",
                )?)?;
            }
            "--convention" => {
                run.convention = Convention::parse(parse_u32_flag(
                    &next_arg(&args, &mut idx, "--convention")?,
                    "--convention",
                )?)?;
            }
            "--mode" => {
                run.mode = GeneratorMode::parse(parse_u32_flag(
                    &next_arg(&args, &mut idx, "--mode")?,
                    "--mode",
                )?)?;
            }
            "--seed" => {
                run.seed = parse_u32_flag(&next_arg(&args, &mut idx, "--seed")?, "--seed")?;
            }
            "--default-re" => {
                run.default_re =
                    parse_i32_flag(&next_arg(&args, &mut idx, "--default-re")?, "--default-re")?;
            }
            "--default-im" => {
                run.default_im =
                    parse_i32_flag(&next_arg(&args, &mut idx, "--default-im")?, "--default-im")?;
            }
            "--initial-re" => {
                run.initial_re =
                    parse_i32_flag(&next_arg(&args, &mut idx, "--initial-re")?, "--initial-re")?;
            }
            "--initial-im" => {
                run.initial_im =
                    parse_i32_flag(&next_arg(&args, &mut idx, "--initial-im")?, "--initial-im")?;
            }
            "--target-frequency" => {
                run.target_frequency = parse_i32_flag(
                    &next_arg(&args, &mut idx, "--target-frequency")?,
                    "--target-frequency",
                )?;
            }
            "--device" => {
                run.device_index =
                    parse_usize_flag(&next_arg(&args, &mut idx, "--device")?, "--device")?;
            }
            "--dump-samples" => {
                dump_timesteps = parse_usize_flag(
                    &next_arg(&args, &mut idx, "--dump-samples")?,
                    "--dump-samples",
                )?;
            }
            "--repeat-random" => {
                run.no_repeat_random = false;
            }
            "--transfer-inputs" => {
                run.timer_only = false;
            }
            "--full-matrix" => {
                run.upper_triangle = false;
            }
            "--no-check" => {
                run.check_results = false;
            }
            "--verbose" => {
                run.verbose = true;
            }
            "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => {
                return Err(format!("unknown flag: {}", other));
            }
        }
        idx += 1;
    }

    Ok(BenchConfig {
        run,
        dump_timesteps,
    })
}

fn usage() -> String {
    "usage: correlator_bench [options]
  --iterations N        accumulation windows to run (default 100)
  --timesamples N       samples per window (default 65536)
  --elements N          antenna inputs (default 256; multiple of 32, or 16 packed)
  --frequencies N       frequency bands (default 8)
  --kernel-variant 0|1  0 standard, 1 packed 16-element (default 0)
  --convention 0|1      imaginary sign convention (default 0)
  --mode 1..4           1 constant, 2 ramp up, 3 ramp down, 4 random (default 4)
  --seed N              generator seed (default 42)
  --default-re N        constant-mode real value
  --default-im N        constant-mode imaginary value
  --initial-re N        ramp-mode starting real value
  --initial-im N        ramp-mode starting imaginary value
  --target-frequency N  generate only this band, -1 for all (default -1)
  --device N            compute device index (default 0)
  --dump-samples N      print the first N timesteps of the window
  --repeat-random       reuse one random stream across timesteps
  --transfer-inputs     re-transfer the input window every cycle
  --full-matrix         compare full matrices instead of upper triangles
  --no-check            skip the reference comparison
  --verbose             print every baseline during comparison"
        .to_string()
}

fn run(config: BenchConfig) -> Result<(), HarnessError> {
    let BenchConfig {
        run: config,
        dump_timesteps,
    } = config;
    config.validate()?;
    let geometry = config.geometry();

    print_kernel_parameters(&geometry);
    print_run_banner(&config);

    let cube = generate(&config.generator_params());
    if dump_timesteps > 0 {
        dump_samples(&cube, dump_timesteps, config.target_frequency);
    }

    let mut backend = SoftwareBackend::new(geometry, config.convention);
    let mut pipeline = CorrelatorPipeline::new(&mut backend, geometry, cube.as_bytes())?;

    let started = Instant::now();
    let output = pipeline.run(&mut backend, config.iterations, config.timer_only)?;
    let elapsed = started.elapsed().as_secs_f64();

    let (clock_mhz, compute_units) = backend.device_throughput_hint();
    print_throughput(&config, &geometry, clock_mhz, compute_units, elapsed);

    if !config.check_results {
        print_unverified_notice();
        return Ok(());
    }

    println!("Checking results. Please wait...");
    let check_started = Instant::now();

    let (accelerator, reference, layout) = match config.kernel_variant {
        KernelVariant::Standard if config.upper_triangle => (
            tile_to_triangle(
                geometry.block_side,
                geometry.num_blocks,
                geometry.num_frequencies,
                geometry.num_elements,
                &output.tiles,
            ),
            generate_and_correlate_triangle(&config.generator_params(), config.convention),
            MatrixLayout::TriangleOnly,
        ),
        KernelVariant::Standard => (
            tile_to_dense(
                geometry.block_side,
                geometry.num_blocks,
                geometry.num_frequencies,
                geometry.num_elements,
                &output.tiles,
            ),
            generate_and_correlate_dense(&config.generator_params(), config.convention),
            MatrixLayout::Dense,
        ),
        KernelVariant::Packed16 => {
            // The kernel ran on one 32-element tile covering two real
            // bands; unpack to the true 16-element geometry first.
            let mut dense = tile_to_dense(
                geometry.block_side,
                geometry.num_blocks,
                geometry.num_frequencies,
                geometry.num_elements,
                &output.tiles,
            );
            compact_padded_output(
                geometry.actual_num_frequencies,
                geometry.actual_num_elements,
                &mut dense,
            );
            if config.upper_triangle {
                let frame_bands = config.frame_frequencies.max(geometry.actual_num_frequencies);
                (
                    triangle_with_frequency_padding(
                        frame_bands,
                        geometry.actual_num_frequencies,
                        geometry.actual_num_elements,
                        &dense,
                    ),
                    generate_and_correlate_triangle(&config.generator_params(), config.convention),
                    MatrixLayout::TriangleOnly,
                )
            } else {
                (
                    dense,
                    generate_and_correlate_dense(&config.generator_params(), config.convention),
                    MatrixLayout::Dense,
                )
            }
        }
    };

    let report = compare(
        &accelerator,
        &reference,
        layout,
        geometry.actual_num_frequencies,
        geometry.actual_num_elements,
        config.verbose,
    );
    print_comparison_summary(&report);
    print_reference_timing(check_started.elapsed().as_secs_f64(), config.num_timesamples);

    Ok(())
}

fn main() {
    let config = match parse_args() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    };

    if let Err(err) = run(config) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
