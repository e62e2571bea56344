//! Run setup: config overrides from flags and job resolution.

use anyhow::Context;
use tidyset_core::config::expand_path;
use tidyset_core::{Config, Job, RunMode};

use super::RunArgs;

/// Load config, apply flag overrides, validate, and resolve directories.
pub fn setup_run(args: &RunArgs) -> anyhow::Result<(Config, Job)> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, args);
    if config.naming.numbering && config.naming.has_rules() {
        anyhow::bail!(
            "Numbering cannot be combined with --prefix, --suffix or --replace.\n\n  \
             Hint: pass --no-numbering to use them."
        );
    }
    config.validate().context("Invalid configuration")?;

    let job = resolve_job(args)?;
    Ok((config, job))
}

/// Fold command-line flags into the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }
    if let Some(size) = args.resize {
        config.transform.resize = Some(size.pixels());
    }
    if let Some(padding) = args.padding {
        config.transform.padding = padding.into();
    }
    if args.png {
        config.transform.save_as_png = true;
    }

    let naming = &mut config.naming;
    if args.no_numbering {
        naming.numbering = false;
    }
    if let Some(start) = args.start {
        naming.start_number = start;
    }
    if let Some(prefix) = &args.prefix {
        naming.use_prefix = true;
        naming.prefix = prefix.clone();
    }
    if let Some(suffix) = &args.suffix {
        naming.use_suffix = true;
        naming.suffix = suffix.clone();
    }
    if let Some([from, to]) = args.replace.as_deref() {
        naming.use_replace = true;
        naming.replace_from = from.clone();
        naming.replace_to = to.clone();
    }
}

/// Work out the input and output directories for the selected mode.
pub fn resolve_job(args: &RunArgs) -> anyhow::Result<Job> {
    let mode = RunMode::from(args.mode);
    let input = expand_path(&args.input);

    if !input.is_dir() {
        anyhow::bail!(
            "Input directory does not exist: {:?}\n\n  Hint: Check the path and try again.",
            input
        );
    }

    let output = match (&args.output, mode.transforms()) {
        (Some(output), _) => expand_path(output),
        (None, false) => input.clone(),
        (None, true) => anyhow::bail!(
            "Mode {} needs an output directory. Pass one with --output.",
            mode
        ),
    };

    Ok(Job {
        input_dir: input,
        output_dir: output,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tidyset_core::config::PaddingColor;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(argv: &[&str]) -> RunArgs {
        let mut full = vec!["tidyset"];
        full.extend_from_slice(argv);
        TestCli::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = parse(&[
            "in", "-o", "out", "-p", "8", "--resize", "1024", "--padding", "transparent",
            "--png", "--start", "100",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.processing.parallel_workers, 8);
        assert_eq!(config.transform.resize, Some(1024));
        assert_eq!(config.transform.padding, PaddingColor::Transparent);
        assert!(config.transform.save_as_png);
        assert_eq!(config.naming.start_number, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rules_without_no_numbering_fail_validation() {
        let args = parse(&["in", "-o", "out", "--prefix", "cat_"]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert!(config.validate().is_err());

        let args = parse(&[
            "in", "-o", "out", "--no-numbering", "--prefix", "cat_", "--replace", "a", "b",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert!(config.validate().is_ok());
        assert_eq!(config.naming.replace_from, "a");
        assert_eq!(config.naming.replace_to, "b");
    }

    #[test]
    fn test_in_place_modes_default_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();

        let job = resolve_job(&parse(&[input, "-m", "check-duplicates"])).unwrap();
        assert_eq!(job.output_dir, dir.path());
        assert_eq!(job.mode, RunMode::CheckDuplicates);

        assert!(resolve_job(&parse(&[input, "-m", "copy-and-text"])).is_err());
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let args = parse(&[missing.to_str().unwrap(), "-o", "out"]);
        assert!(resolve_job(&args).is_err());
    }
}
