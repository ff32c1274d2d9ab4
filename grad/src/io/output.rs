//! Output formatting and logging utilities

use color_eyre::eyre::Result;
use nalgebra::Vector3;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total_seconds = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Setup output logging to file or stdout
pub fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => match File::create(path) {
            Ok(log) => {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false);
                Registry::default().with(file_layer).init();
                info!("Output will be written to: {}", path);
            }
            Err(err) => eprintln!("Could not create output file {}: {}", path, err),
        },
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
        }
    }
}

/// Per-atom gradient table
pub fn print_gradient<W: Write>(writer: &mut W, symbols: &[&str], gradient: &[Vector3<f64>]) -> Result<()> {
    writeln!(writer, "Two-electron gradient (hartree/bohr):")?;
    for (i, (symbol, g)) in symbols.iter().zip(gradient).enumerate() {
        writeln!(
            writer,
            "  Atom {:3} {:>2}  [{:14.8}, {:14.8}, {:14.8}]",
            i + 1,
            symbol,
            g.x,
            g.y,
            g.z
        )?;
    }
    let total: Vector3<f64> = gradient.iter().sum();
    writeln!(writer, "  Sum over atoms: {:.3e}", total.norm())?;
    Ok(())
}
