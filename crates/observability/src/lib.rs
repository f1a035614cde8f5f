//! Tracing/logging setup shared by the binaries.

pub mod tracing;

pub use tracing::LogOutput;

/// Initialize process-wide logging with an explicit output format.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_with(output: LogOutput) {
    tracing::init(output);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_with_tolerates_a_second_format() {
        init_with(LogOutput::Pretty);
        init_with(LogOutput::Json);
    }
}
