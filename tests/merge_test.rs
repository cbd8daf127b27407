//! Integration tests for extracting and merging archives on disk.

use plugin_updater::archive::ArchiveExpander;
use plugin_updater::install::InstallMerger;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

struct Layout {
    _temp: TempDir,
    plugins: PathBuf,
    updates: PathBuf,
}

fn layout() -> Layout {
    let temp = TempDir::new().unwrap();
    let plugins = temp.path().join("plugins");
    let updates = plugins.join("update");
    fs::create_dir_all(&updates).unwrap();
    Layout {
        _temp: temp,
        plugins,
        updates,
    }
}

fn expand_and_merge(layout: &Layout, archive: &Path) {
    let expansion = ArchiveExpander::new(&layout.plugins)
        .expand(archive)
        .unwrap();
    InstallMerger::new()
        .merge(&expansion, &layout.plugins)
        .unwrap();
}

#[test]
fn new_files_join_installed_component() {
    let layout = layout();
    fs::create_dir_all(layout.plugins.join("pluginA")).unwrap();
    fs::write(layout.plugins.join("pluginA/data.txt"), "installed").unwrap();

    let archive = layout.updates.join("bundle.zip");
    write_zip(
        &archive,
        &[("pluginA/data.txt", "stale"), ("pluginA/new.txt", "fresh")],
    );

    expand_and_merge(&layout, &archive);

    assert_eq!(
        fs::read_to_string(layout.plugins.join("pluginA/new.txt")).unwrap(),
        "fresh"
    );
    assert_eq!(
        fs::read_to_string(layout.plugins.join("pluginA/data.txt")).unwrap(),
        "installed"
    );
    assert!(!layout.updates.join("bundle").exists());
    assert!(!archive.exists());
}

#[test]
fn unmatched_component_is_not_installed() {
    let layout = layout();
    fs::create_dir_all(layout.plugins.join("pluginA")).unwrap();

    let archive = layout.updates.join("bundle.zip");
    write_zip(&archive, &[("orphan/readme.txt", "o")]);

    expand_and_merge(&layout, &archive);

    assert!(!layout.plugins.join("orphan").exists());
    assert!(!layout.updates.join("bundle").exists());
}

#[test]
fn installed_packaged_unit_is_replaced() {
    let layout = layout();
    fs::write(layout.plugins.join("MyPlugin.jar"), "old").unwrap();

    let archive = layout.updates.join("MyPlugin.zip");
    write_zip(
        &archive,
        &[("MyPlugin.jar", "new"), ("Dependency.jar", "dep")],
    );

    expand_and_merge(&layout, &archive);

    assert_eq!(
        fs::read_to_string(layout.plugins.join("MyPlugin.jar")).unwrap(),
        "new"
    );
    assert!(!layout.plugins.join("Dependency.jar").exists());
}

#[test]
fn stale_working_dir_is_not_installed() {
    let layout = layout();
    fs::create_dir_all(layout.plugins.join("pluginA")).unwrap();
    let stale = layout.updates.join("bundle/pluginA");
    fs::create_dir_all(&stale).unwrap();
    fs::write(stale.join("leftover.txt"), "from an interrupted run").unwrap();

    let archive = layout.updates.join("bundle.zip");
    write_zip(&archive, &[("pluginA/new.txt", "fresh")]);

    expand_and_merge(&layout, &archive);

    assert!(layout.plugins.join("pluginA/new.txt").exists());
    assert!(!layout.plugins.join("pluginA/leftover.txt").exists());
}
