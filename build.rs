use chrono::Utc;
use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

/// target/<profile> 目录，运行时从可执行文件上级查找 static/ 与 config/
fn profile_dir() -> Option<PathBuf> {
    let out_dir = std::env::var("OUT_DIR").ok()?;
    Path::new(&out_dir)
        .ancestors()
        .nth(3)
        .map(|p| p.to_path_buf())
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=VERSION");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-changed=static");
    println!("cargo:rerun-if-changed=config.example.yaml");

    set_build_metadata();

    let Some(profile_dir) = profile_dir() else {
        println!("cargo:warning=无法确定输出目录，跳过资源复制");
        return Ok(());
    };

    // 复制前端脚本
    if Path::new("static").exists() {
        copy_dir_all("static", profile_dir.join("static"))?;
    } else {
        println!("cargo:warning=静态文件目录不存在");
    }

    // 复制示例配置文件
    if Path::new("config.example.yaml").exists() {
        fs::copy(
            "config.example.yaml",
            profile_dir.join("config.example.yaml"),
        )?;
    }

    for dir in ["logs", "data", "uploads"] {
        fs::create_dir_all(profile_dir.join(dir))?;
    }

    Ok(())
}

fn set_build_metadata() {
    let git_commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let build_version = fs::read_to_string("VERSION")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=APP_BUILD_VERSION={}", build_version);
    println!("cargo:rustc-env=APP_BUILD_COMMIT={}", git_commit);
    println!("cargo:rustc-env=APP_BUILD_TIMESTAMP={}", Utc::now().to_rfc3339());
}

fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir_all(entry.path(), dst.join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }
    Ok(())
}
