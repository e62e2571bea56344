//! The `tidyset dupes` command: list duplicate groups without deleting.

use clap::Args;
use std::path::PathBuf;
use tidyset_core::config::expand_path;
use tidyset_core::{BatchPipeline, Config, FingerprintGroup, Job, RunMode};

/// Arguments for the `dupes` command.
#[derive(Args, Debug)]
pub struct DupesArgs {
    /// Directory to scan (not recursive)
    #[arg(required = true)]
    pub dir: PathBuf,

    /// Print the groups as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Execute the dupes command.
pub async fn execute(args: DupesArgs) -> anyhow::Result<()> {
    let dir = expand_path(&args.dir);
    let config = Config::load()?;
    let pipeline = BatchPipeline::new(
        &config,
        Job {
            input_dir: dir.clone(),
            output_dir: dir,
            mode: RunMode::CheckDuplicates,
        },
    )?;

    let groups = pipeline.find_duplicates().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        print!("{}", render_groups(&groups));
    }
    Ok(())
}

fn render_groups(groups: &[FingerprintGroup]) -> String {
    if groups.is_empty() {
        return "No duplicates found.\n".to_string();
    }

    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        out.push_str(&format!(
            "Group {} ({} files, {}):\n",
            i + 1,
            group.paths.len(),
            &group.fingerprint[..group.fingerprint.len().min(12)]
        ));
        for (j, path) in group.paths.iter().enumerate() {
            let marker = if j == 0 { "keep  " } else { "remove" };
            out.push_str(&format!("  {} {}\n", marker, path.display()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_first_as_kept() {
        let groups = vec![FingerprintGroup {
            fingerprint: "0123456789abcdef0123".into(),
            paths: vec!["a.png".into(), "b.png".into()],
        }];
        let text = render_groups(&groups);
        assert!(text.starts_with("Group 1 (2 files, 0123456789ab):"));
        assert!(text.contains("keep   a.png"));
        assert!(text.contains("remove b.png"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_groups(&[]), "No duplicates found.\n");
    }
}
