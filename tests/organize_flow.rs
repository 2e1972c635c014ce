mod common;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use arenalabel::organize::{organize_dataset, DatasetLayout, Split, SplitOptions};

use common::{file_names, frame_stems, seed_pool};

fn stems_in(dir: &Path, ext: &str) -> BTreeSet<String> {
    file_names(dir)
        .into_iter()
        .filter_map(|name| name.strip_suffix(&format!(".{ext}")).map(str::to_string))
        .collect()
}

#[test]
fn identical_pools_split_identically() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    seed_pool(first.path(), &frame_stems(30));
    seed_pool(second.path(), &frame_stems(30));

    let opts = SplitOptions {
        val_ratio: 0.2,
        seed: 1234,
    };
    organize_dataset(first.path(), &opts).unwrap();
    organize_dataset(second.path(), &opts).unwrap();

    let val_a = stems_in(&DatasetLayout::new(first.path()).images_dir(Split::Val), "jpg");
    let val_b = stems_in(&DatasetLayout::new(second.path()).images_dir(Split::Val), "jpg");
    assert_eq!(val_a.len(), 6);
    assert_eq!(val_a, val_b);
}

#[test]
fn images_and_labels_land_in_matching_splits() {
    let temp = tempfile::tempdir().unwrap();
    seed_pool(temp.path(), &frame_stems(12));
    organize_dataset(temp.path(), &SplitOptions::default()).unwrap();

    let layout = DatasetLayout::new(temp.path());
    for split in [Split::Train, Split::Val] {
        assert_eq!(
            stems_in(&layout.images_dir(split), "jpg"),
            stems_in(&layout.labels_dir(split), "txt")
        );
    }

    let pool_leftovers: Vec<String> = file_names(&layout.pool_dir())
        .into_iter()
        .filter(|name| name.ends_with(".jpg") || name.ends_with(".txt"))
        .collect();
    assert!(pool_leftovers.is_empty());
}

#[test]
fn label_contents_survive_the_move() {
    let temp = tempfile::tempdir().unwrap();
    seed_pool(temp.path(), &frame_stems(1));
    let report = organize_dataset(temp.path(), &SplitOptions::default()).unwrap();

    // One pair at ratio 0.2 rounds down to zero val pairs.
    assert_eq!((report.train, report.val), (1, 0));
    let moved = temp.path().join("labels/train/video 1_00000.txt");
    assert_eq!(fs::read_to_string(moved).unwrap(), "0 0.5 0.5 0.25 0.25\n");
}

#[test]
fn empty_pool_creates_layout_and_moves_nothing() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir_all(temp.path().join("labels")).unwrap();

    let report = organize_dataset(temp.path(), &SplitOptions::default()).unwrap();
    assert_eq!(report.total(), 0);
    assert!(temp.path().join("images/train").is_dir());
    assert!(temp.path().join("labels/val").is_dir());
}

#[test]
fn second_run_finds_nothing_left_to_split() {
    let temp = tempfile::tempdir().unwrap();
    seed_pool(temp.path(), &frame_stems(10));

    organize_dataset(temp.path(), &SplitOptions::default()).unwrap();
    let again = organize_dataset(temp.path(), &SplitOptions::default()).unwrap();

    assert_eq!(again.total(), 0);
    assert_eq!(file_names(&temp.path().join("images/train")).len(), 8);
}

#[test]
fn rerun_after_interruption_completes_the_split() {
    let temp = tempfile::tempdir().unwrap();
    seed_pool(temp.path(), &frame_stems(10));
    organize_dataset(temp.path(), &SplitOptions::default()).unwrap();

    // Stopped between the image move and the label move.
    let layout = DatasetLayout::new(temp.path());
    let stem = stems_in(&layout.labels_dir(Split::Val), "txt")
        .into_iter()
        .next()
        .unwrap();
    fs::rename(
        layout.labels_dir(Split::Val).join(format!("{stem}.txt")),
        layout.pool_dir().join(format!("{stem}.txt")),
    )
    .unwrap();

    let report = organize_dataset(temp.path(), &SplitOptions::default()).unwrap();
    assert!(report.orphans.is_empty());
    assert_eq!(report.already_placed, 1);
    assert_eq!(report.val, 1);
    assert!(layout.labels_dir(Split::Val).join(format!("{stem}.txt")).is_file());
    assert!(!layout.pool_dir().join(format!("{stem}.txt")).exists());
    for split in [Split::Train, Split::Val] {
        assert_eq!(
            stems_in(&layout.images_dir(split), "jpg"),
            stems_in(&layout.labels_dir(split), "txt")
        );
    }
}
