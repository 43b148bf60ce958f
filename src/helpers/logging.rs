use anyhow::{Context, Result};
use clap::Args;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use flexi_logger::{colored_default_format, detailed_format, Logger, LoggerHandle, WriteMode};
use log::LevelFilter;

/// Crates below our own code that get chatty at debug level.
const HTTP_STACK: [&str; 4] = ["hyper", "reqwest", "rustls", "h2"];

#[derive(Args, Debug)]
#[group(id = "bootstrap")]
pub struct Params {
    // Warn by default, rendered probe lines go to stdout and shouldn't drown in logs
    #[clap(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Use a flexi_logger configuration file instead of -v/-q
    #[arg(long = "log-spec")]
    use_log_spec: bool,

    /// Path to log spec, watched for changes while running
    #[arg(long, value_name = "TOML FILE", default_value = "logspec.toml")]
    log_spec_file: std::path::PathBuf,
}

impl Params {
    /// flexi_logger spec for the chosen verbosity. `-v` is about probes, so the HTTP stack
    /// of the throughput test never goes below warn.
    fn level_spec(&self) -> String {
        let level = self.verbose.log_level_filter();
        let http_level = level.min(LevelFilter::Warn);
        let mut spec = level.to_string().to_lowercase();
        for module in HTTP_STACK {
            spec.push_str(&format!(", {}={}", module, http_level.to_string().to_lowercase()));
        }
        spec
    }
}

/// Logs go to stderr, stdout belongs to the renderer.
pub fn configure_from(params: &Params) -> Result<LoggerHandle> {
    let log_builder = Logger::try_with_env_or_str(params.level_spec())
        .context("Failed to parse logger spec from env RUST_LOG or cli level")?
        .write_mode(WriteMode::Async)
        .format_for_stderr(colored_default_format)
        .format_for_files(detailed_format);

    if params.use_log_spec {
        let specfile_path = &params.log_spec_file;
        log_builder
            .start_with_specfile(specfile_path)
            .with_context(|| format!("Failed to start logger with specfile {:?}", specfile_path))
    } else {
        log_builder
            .start()
            .context("Failed to start logger handle w/o specfile")
    }
}

#[cfg(test)]
mod tests {
    use assertor::*;
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[clap(flatten)]
        logging: Params,
    }

    fn spec_for(args: &[&str]) -> String {
        let argv = std::iter::once("ping-buddy").chain(args.iter().copied());
        TestCli::parse_from(argv).logging.level_spec()
    }

    #[test]
    fn warn_by_default() {
        // given, when
        let spec = spec_for(&[]);

        // then
        assert_that!(spec.as_str())
            .is_equal_to("warn, hyper=warn, reqwest=warn, rustls=warn, h2=warn");
    }

    #[test]
    fn verbose_leaves_http_stack_at_warn() {
        // given, when
        let spec = spec_for(&["-vv"]);

        // then
        assert_that!(spec.starts_with("debug, ")).is_true();
        assert_that!(spec.contains("hyper=warn")).is_true();
        assert_that!(spec.contains("reqwest=warn")).is_true();
    }

    #[test]
    fn quiet_applies_everywhere() {
        // given, when
        let spec = spec_for(&["-q"]);

        // then
        assert_that!(spec.as_str())
            .is_equal_to("error, hyper=error, reqwest=error, rustls=error, h2=error");
    }

    #[test]
    fn very_quiet_is_off() {
        // given, when
        let spec = spec_for(&["-qq"]);

        // then
        assert_that!(spec.starts_with("off, ")).is_true();
        assert_that!(spec.contains("rustls=off")).is_true();
    }
}
