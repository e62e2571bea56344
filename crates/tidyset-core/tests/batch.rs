//! End-to-end runs of the batch pipeline against temporary directories.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tidyset_core::{
    BatchPipeline, Config, ConfigError, Job, PipelineError, RunMode, TidysetError,
};

fn write_image(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
        .save(path)
        .unwrap();
}

fn config(workers: usize) -> Config {
    let mut config = Config::default();
    config.processing.parallel_workers = workers;
    config.pipeline.retry_delay_ms = 0;
    config
}

fn rule_config() -> Config {
    let mut config = config(2);
    config.naming.numbering = false;
    config
}

fn job(input: &Path, output: &Path, mode: RunMode) -> Job {
    Job {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        mode,
    }
}

fn names(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Seven sources, two pairs of which share a file name in different folders.
fn populate_input(input: &Path) {
    write_image(&input.join("cat.png"), 8, 8, [1, 0, 0]);
    write_image(&input.join("dog.png"), 8, 8, [2, 0, 0]);
    write_image(&input.join("a/cat.png"), 8, 8, [3, 0, 0]);
    write_image(&input.join("a/eel.bmp"), 8, 8, [4, 0, 0]);
    write_image(&input.join("b/dog.png"), 8, 8, [5, 0, 0]);
    write_image(&input.join("b/7.png"), 8, 8, [6, 0, 0]);
    write_image(&input.join("b/c/ant.gif"), 8, 8, [7, 0, 0]);
    std::fs::write(input.join("notes.txt"), b"not an image").unwrap();
}

#[tokio::test]
async fn sequential_names_are_one_to_n_for_any_worker_count() {
    for workers in [1, 3, 8] {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        populate_input(input.path());

        let mut cfg = config(workers);
        cfg.transform.save_as_png = true;
        let pipeline =
            BatchPipeline::new(&cfg, job(input.path(), output.path(), RunMode::CopyOnly)).unwrap();
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.discovered, 7, "workers={workers}");
        assert_eq!(report.processed, 7);
        assert_eq!(report.renamed.len(), 7);
        assert!(report.errors.is_empty());
        assert_eq!(
            names(output.path()),
            set(&["1.png", "2.png", "3.png", "4.png", "5.png", "6.png", "7.png"]),
            "workers={workers}"
        );
        assert!(pipeline.progress().snapshot().is_complete());
    }
}

#[tokio::test]
async fn sequential_numbering_skips_numbers_already_in_output() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(&input.path().join("x.png"), 4, 4, [1, 1, 1]);
    write_image(&input.path().join("y.png"), 4, 4, [2, 2, 2]);
    write_image(&output.path().join("1.png"), 4, 4, [9, 9, 9]);
    write_image(&output.path().join("3.png"), 4, 4, [9, 9, 9]);

    let report = BatchPipeline::new(
        &config(2),
        job(input.path(), output.path(), RunMode::CopyOnly),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    let targets: Vec<PathBuf> = report.renamed.iter().map(|r| r.to.clone()).collect();
    assert_eq!(
        targets,
        vec![output.path().join("2.png"), output.path().join("4.png")]
    );
}

#[tokio::test]
async fn copy_and_text_labels_follow_final_names() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(&input.path().join("b.jpg"), 6, 6, [10, 10, 10]);
    write_image(&input.path().join("a.png"), 6, 6, [20, 20, 20]);

    let report = BatchPipeline::new(
        &config(2),
        job(input.path(), output.path(), RunMode::CopyAndText),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(report.sidecars_created, 2);
    assert_eq!(
        names(output.path()),
        set(&["1.png", "1.txt", "2.jpg", "2.txt"])
    );
    // Sources are never touched
    assert!(input.path().join("a.png").exists());
    assert!(input.path().join("b.jpg").exists());
}

#[tokio::test]
async fn rule_based_noop_is_skipped_not_renamed() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(&input.path().join("cat.png"), 4, 4, [0, 0, 0]);

    let report = BatchPipeline::new(
        &rule_config(),
        job(input.path(), output.path(), RunMode::CopyAndText),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert!(report.renamed.is_empty());
    assert_eq!(report.skipped, vec![output.path().join("cat.png")]);
    assert_eq!(report.sidecars_created, 1);
    assert_eq!(names(output.path()), set(&["cat.png", "cat.txt"]));
}

#[tokio::test]
async fn rule_based_rules_apply_in_order() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(&input.path().join("img_cat.png"), 4, 4, [0, 0, 0]);

    let mut cfg = rule_config();
    cfg.naming.use_replace = true;
    cfg.naming.replace_from = "img_".into();
    cfg.naming.replace_to = String::new();
    cfg.naming.use_prefix = true;
    cfg.naming.prefix = "train_".into();
    cfg.naming.use_suffix = true;
    cfg.naming.suffix = "_v1".into();

    let report = BatchPipeline::new(&cfg, job(input.path(), output.path(), RunMode::CopyOnly))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.renamed.len(), 1);
    assert_eq!(names(output.path()), set(&["train_cat_v1.png"]));
}

#[tokio::test]
async fn failed_transform_renames_nothing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(&input.path().join("good.png"), 20, 10, [5, 5, 5]);
    std::fs::write(input.path().join("broken.png"), b"\x89PNG\r\n\x1a\ntruncated").unwrap();

    let mut cfg = config(2);
    cfg.transform.resize = Some(512);
    let result = BatchPipeline::new(&cfg, job(input.path(), output.path(), RunMode::CopyAndText))
        .unwrap()
        .run()
        .await;

    match result {
        Err(TidysetError::Pipeline(PipelineError::BatchFailed { total, failures })) => {
            assert_eq!(total, 2);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].path, input.path().join("broken.png"));
        }
        other => panic!("expected BatchFailed, got {:?}", other.map(|r| r.renamed)),
    }
    assert!(names(output.path()).is_empty());
}

#[tokio::test]
async fn oversized_input_goes_through_degraded_path() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(&input.path().join("huge.png"), 300, 150, [0, 200, 0]);

    let mut cfg = config(1);
    cfg.limits.max_image_dimension = 100;
    cfg.limits.oversize_envelope = 64;
    cfg.transform.resize = Some(512);
    cfg.transform.padding = tidyset_core::config::PaddingColor::White;

    let report = BatchPipeline::new(&cfg, job(input.path(), output.path(), RunMode::CopyOnly))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.errors.is_empty());
    let written = image::open(output.path().join("1.png")).unwrap();
    assert_eq!(written.dimensions(), (512, 512));
}

#[tokio::test]
async fn check_duplicates_keeps_first_of_each_group() {
    let dir = tempfile::tempdir().unwrap();
    write_image(&dir.path().join("1.png"), 10, 10, [7, 7, 7]);
    write_image(&dir.path().join("2.bmp"), 10, 10, [7, 7, 7]);
    write_image(&dir.path().join("3.png"), 10, 10, [7, 7, 7]);
    write_image(&dir.path().join("4.png"), 10, 10, [8, 8, 8]);
    std::fs::write(dir.path().join("2.txt"), b"label").unwrap();

    let pipeline = BatchPipeline::new(
        &config(2),
        job(dir.path(), dir.path(), RunMode::CheckDuplicates),
    )
    .unwrap();
    let report = pipeline.run().await.unwrap();

    let duplicates = report.duplicates.unwrap();
    assert_eq!(duplicates.scanned, 4);
    assert_eq!(duplicates.groups.len(), 1);
    assert_eq!(duplicates.removed_count(), 2);
    assert_eq!(names(dir.path()), set(&["1.png", "4.png"]));
}

#[tokio::test]
async fn find_duplicates_lists_without_deleting() {
    let dir = tempfile::tempdir().unwrap();
    write_image(&dir.path().join("a.png"), 10, 10, [7, 7, 7]);
    write_image(&dir.path().join("b.png"), 10, 10, [7, 7, 7]);

    let pipeline = BatchPipeline::new(
        &config(1),
        job(dir.path(), dir.path(), RunMode::CheckDuplicates),
    )
    .unwrap();
    let groups = pipeline.find_duplicates().await.unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(names(dir.path()), set(&["a.png", "b.png"]));
}

#[tokio::test]
async fn rename_only_renumbers_deterministically() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("5.png"), b"five").unwrap();
    std::fs::write(dir.path().join("a.png"), b"a").unwrap();
    std::fs::write(dir.path().join("b.jpg"), b"b").unwrap();
    std::fs::write(dir.path().join("a.txt"), b"label for a").unwrap();

    let report = BatchPipeline::new(&config(1), job(dir.path(), dir.path(), RunMode::RenameOnly))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.discovered, 3);
    assert_eq!(report.renamed.len(), 3);
    assert_eq!(
        names(dir.path()),
        set(&["1.png", "2.png", "2.txt", "3.jpg"])
    );
    assert_eq!(std::fs::read(dir.path().join("1.png")).unwrap(), b"five");
    assert_eq!(std::fs::read(dir.path().join("2.png")).unwrap(), b"a");
    assert_eq!(
        std::fs::read(dir.path().join("2.txt")).unwrap(),
        b"label for a"
    );
}

#[tokio::test]
async fn text_only_creates_missing_labels() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("1.png"), b"x").unwrap();
    std::fs::write(dir.path().join("2.png"), b"x").unwrap();
    std::fs::write(dir.path().join("2.txt"), b"existing").unwrap();

    let report = BatchPipeline::new(&config(1), job(dir.path(), dir.path(), RunMode::TextOnly))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.sidecars_created, 1);
    assert_eq!(std::fs::read(dir.path().join("2.txt")).unwrap(), b"existing");
    assert!(dir.path().join("1.txt").exists());
}

#[tokio::test]
async fn numbering_with_rules_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(1);
    cfg.naming.use_suffix = true;
    cfg.naming.suffix = "_x".into();

    let result = BatchPipeline::new(&cfg, job(dir.path(), dir.path(), RunMode::CopyOnly));
    assert!(matches!(
        result,
        Err(TidysetError::Config(ConfigError::ValidationError(_)))
    ));
}

#[tokio::test]
async fn missing_input_and_same_directories_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let missing = BatchPipeline::new(
        &config(1),
        job(&dir.path().join("nope"), dir.path(), RunMode::CopyOnly),
    )
    .unwrap()
    .run()
    .await;
    assert!(matches!(
        missing,
        Err(TidysetError::Pipeline(PipelineError::DirectoryNotFound(_)))
    ));

    let same = BatchPipeline::new(&config(1), job(dir.path(), dir.path(), RunMode::CopyOnly))
        .unwrap()
        .run()
        .await;
    assert!(matches!(
        same,
        Err(TidysetError::Config(ConfigError::ValidationError(_)))
    ));
}

#[tokio::test]
async fn sequential_run_adopts_leftover_staging_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(&input.path().join("cat.png"), 4, 4, [1, 2, 3]);
    write_image(&input.path().join("dog.png"), 4, 4, [4, 5, 6]);
    // Same staging name the new cat.png would get
    std::fs::write(output.path().join(".tidyset-cat.png"), b"LEFTOVER").unwrap();

    let report = BatchPipeline::new(
        &config(2),
        job(input.path(), output.path(), RunMode::CopyOnly),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.renamed.len(), 3);
    assert_eq!(names(output.path()), set(&["1.png", "2.png", "3.png"]));
    let read = |name: &str| std::fs::read(output.path().join(name)).unwrap();
    assert_eq!(read("1.png"), b"LEFTOVER");
    assert_eq!(read("2.png"), std::fs::read(input.path().join("cat.png")).unwrap());
    assert_eq!(read("3.png"), std::fs::read(input.path().join("dog.png")).unwrap());
}

#[tokio::test]
async fn rename_only_finishes_an_interrupted_run() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".tidyset-1.png"), b"LEFTOVER").unwrap();
    std::fs::write(dir.path().join("1.png"), b"NUMBERED").unwrap();
    std::fs::write(dir.path().join("b.png"), b"B").unwrap();

    let report = BatchPipeline::new(&config(1), job(dir.path(), dir.path(), RunMode::RenameOnly))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.errors.is_empty());
    assert_eq!(names(dir.path()), set(&["1.png", "2.png", "3.png"]));
    let read = |name: &str| std::fs::read(dir.path().join(name)).unwrap();
    assert_eq!(read("1.png"), b"LEFTOVER");
    assert_eq!(read("2.png"), b"NUMBERED");
    assert_eq!(read("3.png"), b"B");
}

#[tokio::test]
async fn rule_based_run_keeps_existing_outputs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(&input.path().join("dog.png"), 4, 4, [7, 7, 7]);
    std::fs::write(output.path().join("dog.png"), b"EARLIER OUTPUT").unwrap();

    let mut cfg = rule_config();
    cfg.naming.use_suffix = true;
    cfg.naming.suffix = "_v".into();

    let report = BatchPipeline::new(&cfg, job(input.path(), output.path(), RunMode::CopyOnly))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.renamed.len(), 1);
    assert_eq!(names(output.path()), set(&["dog.png", "dog_2_v.png"]));
    assert_eq!(
        std::fs::read(output.path().join("dog.png")).unwrap(),
        b"EARLIER OUTPUT"
    );
    assert_eq!(
        std::fs::read(output.path().join("dog_2_v.png")).unwrap(),
        std::fs::read(input.path().join("dog.png")).unwrap()
    );
}

#[tokio::test]
async fn in_place_rule_and_label_runs_ignore_staging_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".tidyset-x.png"), b"staged").unwrap();
    std::fs::write(dir.path().join("cat.png"), b"cat").unwrap();

    let report = BatchPipeline::new(&config(1), job(dir.path(), dir.path(), RunMode::TextOnly))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(
        names(dir.path()),
        set(&[".tidyset-x.png", "cat.png", "cat.txt"])
    );

    let mut cfg = rule_config();
    cfg.naming.use_prefix = true;
    cfg.naming.prefix = "p_".into();
    let report = BatchPipeline::new(&cfg, job(dir.path(), dir.path(), RunMode::RenameOnly))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.renamed.len(), 1);
    assert_eq!(
        names(dir.path()),
        set(&[".tidyset-x.png", "p_cat.png", "p_cat.txt"])
    );
}
