use crate::compare::ComparisonReport;
use crate::config::{KernelGeometry, RunConfig};

/// Print the compile-time constant set a kernel build for this run
/// would be parameterized with.
pub fn print_kernel_parameters(geometry: &KernelGeometry) {
    println!(
        "-D ACTUAL_NUM_ELEMENTS={}u \n-D ACTUAL_NUM_FREQUENCIES={}u \n-D NUM_ELEMENTS={}u \n-D NUM_FREQUENCIES={}u \n-D NUM_BLOCKS={}u \n-D NUM_TIMESAMPLES={}u",
        geometry.actual_num_elements,
        geometry.actual_num_frequencies,
        geometry.num_elements,
        geometry.num_frequencies,
        geometry.num_blocks,
        geometry.num_timesamples
    );
}

pub fn print_run_banner(config: &RunConfig) {
    println!(
        "[{}] Running {} iterations of full corr ({} time samples ({} Ki time samples), {} elements, {} frequencies)",
        chrono::Local::now().format("%H:%M:%S"),
        config.iterations,
        config.num_timesamples,
        config.num_timesamples / 1024,
        config.num_elements,
        config.num_frequencies
    );
}

/// Raw multiply-add throughput of the device: 16-lane units issuing a
/// 4-wide fused multiply-add (2 flops) per clock per compute unit.
pub fn card_tflops(clock_mhz: u32, compute_units: u32) -> f64 {
    f64::from(clock_mhz) * 1e6 * f64::from(compute_units) * 16.0 * 4.0 * 2.0 / 1e12
}

/// Achieved rate and efficiency against two ceilings: the ideal
/// triangle-only operation count, and what the tiled algorithm actually
/// executes (full diagonal tiles included).
pub fn print_throughput(
    config: &RunConfig,
    geometry: &KernelGeometry,
    clock_mhz: u32,
    compute_units: u32,
    elapsed_seconds: f64,
) {
    let tflops = card_tflops(clock_mhz, compute_units);
    let iterations = config.iterations as f64;
    let timesamples = config.num_timesamples as f64;
    let elements = config.num_elements as f64;
    let frequencies = config.num_frequencies as f64;
    let matrices_khz = timesamples * frequencies / elapsed_seconds / 1000.0 * iterations;

    println!(
        "Correlation matrices computation time: {:6.4}s ({:.1} kHz of 400 MHz band, or {:.1}x10^3 correlation matrices/s)",
        elapsed_seconds, matrices_khz, matrices_khz
    );

    let triangle_ops = elements / 2.0 * (elements + 1.0) * 2.0 * 2.0;
    println!(
        "    [Theoretical max: @{:.1} TFLOPS, {:.1} kHz; {:2.0}% efficiency]",
        tflops,
        tflops * 1e12 / triangle_ops / 1e3,
        100.0 * iterations * timesamples / elapsed_seconds / (tflops * 1e12)
            * triangle_ops
            * frequencies
    );

    let tile_ops =
        (geometry.num_blocks * geometry.block_side * geometry.block_side) as f64 * 2.0 * 2.0;
    println!(
        "    [Algorithm max:   @{:.1} TFLOPS, {:.1} kHz; {:2.0}% efficiency]",
        tflops,
        tflops * 1e12 / tile_ops / 1e3,
        100.0 * iterations * timesamples / elapsed_seconds / (tflops * 1e12)
            * tile_ops
            * frequencies
    );
}

pub fn print_comparison_summary(report: &ComparisonReport) {
    println!(
        "\nTotal number of errors: {}, Sum of Squared Differences: {}",
        report.num_errors, report.sum_squared_error
    );
    println!(
        "sqrt(sum of squared differences/numberElements): {:.6}",
        report.rms_error()
    );
    println!(
        "Maximum amplitude squared error: {}",
        report.max_squared_error
    );
    if report.matches() {
        println!("Correlation/accumulation successful! CPU matches GPU.");
    } else {
        println!(
            "Error with correlation/accumulation! Num Err: {} and length of correlated data: {}",
            report.num_errors,
            report.baseline_count()
        );
    }
}

pub fn print_reference_timing(elapsed_seconds: f64, num_timesamples: usize) {
    println!(
        "Full Corr: {:4.2}s on CPU ({:.2} kHz)",
        elapsed_seconds,
        num_timesamples as f64 / elapsed_seconds / 1e3
    );
}

pub fn print_unverified_notice() {
    println!(
        "\nGPU calculations have not been verified. If kernels have been changed, be careful regarding these results.\n"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_tflops_matches_hand_computation() {
        // 930 MHz * 44 CUs * 16 lanes * 4-wide * 2 flops = 5.24 TFLOPS.
        let tflops = card_tflops(930, 44);
        assert!((tflops - 5.237).abs() < 0.01);
    }
}
