//! Integration tests for the CLI against a local mirror directory.
//!
//! Each test writes a config file that points logging and the disk cache
//! into a temporary directory, so nothing touches the user's cache.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

/// Temporary mirror, cache, and config for one CLI run.
struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let ws = Self { temp };

        let config = format!(
            "[cache]\ndirectory = {}\n\n[remote]\nsource = {}\n\n[logging]\ndirectory = {}\n",
            ws.cache_dir().display(),
            ws.mirror().display(),
            ws.temp.path().join("logs").display(),
        );
        fs::write(ws.config_path(), config).expect("Failed to write config");
        ws
    }

    fn mirror(&self) -> PathBuf {
        self.temp.path().join("mirror")
    }

    fn cache_dir(&self) -> PathBuf {
        self.temp.path().join("cache")
    }

    fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.ini")
    }

    fn add_file(&self, relative: &str, data: &[u8]) {
        let path = self.mirror().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_assetcache"))
            .arg("--config")
            .arg(self.config_path())
            .args(args)
            .output()
            .expect("Failed to execute CLI command")
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png).unwrap();
    cursor.into_inner()
}

fn assert_success(output: &Output, context: &str) {
    if !output.status.success() {
        panic!(
            "{} failed:\nstdout: {}\nstderr: {}",
            context,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn cached_file(cache_dir: &Path, kind_dir: &str, file: &str) -> PathBuf {
    cache_dir.join(kind_dir).join(file)
}

#[test]
fn test_model_fetch_populates_disk_cache() {
    let ws = Workspace::new();
    ws.add_file(
        "avatar_assets/models/clothes/tops/tops_blue_01.usdz",
        b"usdz bytes",
    );

    let output = ws.run(&["model", "tops_blue_01"]);
    assert_success(&output, "model");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tops_blue_01"), "stdout: {}", stdout);
    assert!(cached_file(&ws.cache_dir(), "models", "tops_blue_01.usdz").exists());
}

#[test]
fn test_missing_model_exit_code() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.mirror()).unwrap();

    let output = ws.run(&["model", "tops_missing"]);

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_thumbnail_output_png() {
    let ws = Workspace::new();
    ws.add_file(
        "avatar_assets/thumbnails/base/eyes/eye_round.jpg",
        &png(400, 300),
    );
    let out = ws.temp.path().join("eye_round.png");

    let output = ws.run(&["thumbnail", "eye_round", "--output", out.to_str().unwrap()]);
    assert_success(&output, "thumbnail");

    let saved = image::open(&out).unwrap();
    assert_eq!((saved.width(), saved.height()), (200, 200));
}

#[test]
fn test_clear_then_stats() {
    let ws = Workspace::new();
    ws.add_file("avatar_assets/models/clothes/socks/socks_red.usdz", b"socks");

    assert_success(&ws.run(&["model", "socks_red"]), "model");
    assert_success(&ws.run(&["clear"]), "clear");
    assert!(!cached_file(&ws.cache_dir(), "models", "socks_red.usdz").exists());

    let output = ws.run(&["stats"]);
    assert_success(&output, "stats");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Total: 0B"));
}

#[test]
fn test_fetch_without_source_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.ini");
    fs::write(
        &config,
        format!(
            "[cache]\ndirectory = {}\n\n[logging]\ndirectory = {}\n",
            temp.path().join("cache").display(),
            temp.path().join("logs").display()
        ),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_assetcache"))
        .arg("--config")
        .arg(&config)
        .args(["model", "tops_blue_01"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}
