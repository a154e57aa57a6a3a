//! API工具函数模块
//! 上传文件名处理等共享工具函数

use chrono::{DateTime, Local};
use nanoid::nanoid;
use regex::Regex;
use std::sync::OnceLock;

const SUFFIX_ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j',
    'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const SUFFIX_LEN: usize = 6;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("filename regex compile should succeed"))
}

fn dot_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{2,}").expect("dot regex compile should succeed"))
}

/// 取最后一个 `.` 之后的扩展名（小写）
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// 扩展名是否在允许列表中（忽略大小写）
pub fn allowed_file(filename: &str, allowed_extensions: &[String]) -> bool {
    match file_extension(filename) {
        Some(ext) => allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

/// 生成可安全落盘的文件名
///
/// 路径分隔符替换为空格，空白合并为 `_`，去掉 `[A-Za-z0-9_.-]` 以外的字符，
/// 连续的 `.` 合并为一个，再去掉首尾的 `.` 和 `_`。结果为空或丢失了扩展名时回退为 `upload.{ext}`。
pub fn secure_filename(filename: &str, extension: &str) -> String {
    let replaced = filename.replace(['/', '\\'], " ");
    let joined = replaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = unsafe_chars().replace_all(&joined, "");
    let cleaned = dot_runs().replace_all(&cleaned, ".");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    let keeps_extension = file_extension(trimmed)
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false);
    let has_stem = trimmed
        .rsplit_once('.')
        .map(|(stem, _)| !stem.is_empty())
        .unwrap_or(false);

    if keeps_extension && has_stem {
        trimmed.to_string()
    } else {
        format!("upload.{}", extension.to_lowercase())
    }
}

/// `{YYYYmmddHHMMSS}_{name}`
pub fn timestamped_filename(now: DateTime<Local>, safe_name: &str) -> String {
    format!("{}_{}", now.format("%Y%m%d%H%M%S"), safe_name)
}

/// 同名文件已存在时，在扩展名前插入随机后缀
pub fn with_random_suffix(filename: &str) -> String {
    let suffix = nanoid!(SUFFIX_LEN, SUFFIX_ALPHABET);
    match filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", filename, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn allowed() -> Vec<String> {
        vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
    }

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("river.PNG", &allowed()));
        assert!(allowed_file("a.b.jpeg", &allowed()));
        assert!(!allowed_file("river", &allowed()));
        assert!(!allowed_file("river.gif", &allowed()));
        assert!(!allowed_file("river.", &allowed()));
        assert!(!allowed_file("png", &allowed()));
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My River Photo.jpg", "jpg"), "My_River_Photo.jpg");
        assert_eq!(secure_filename("../../etc/passwd.png", "png"), "etc_passwd.png");
        assert_eq!(secure_filename("  __hidden.png", "png"), "hidden.png");
        assert_eq!(secure_filename("河流.jpg", "jpg"), "upload.jpg");
        assert_eq!(secure_filename("照片.JPG", "jpg"), "upload.jpg");
        assert_eq!(secure_filename("photo.JPG", "jpg"), "photo.JPG");
        assert_eq!(secure_filename("photo..jpg", "jpg"), "photo.jpg");
        assert_eq!(secure_filename("a...b.jpeg", "jpeg"), "a.b.jpeg");
        assert_eq!(secure_filename("IMG..1.png", "png"), "IMG.1.png");
    }

    #[test]
    fn test_secure_filename_is_flat_key() {
        for name in ["photo..jpg", "..\\..\\x..png", "a. .b.png", "._..png"] {
            let ext = file_extension(name).unwrap();
            let key = timestamped_filename(Local::now(), &secure_filename(name, &ext));
            assert!(crate::storage::is_flat_key(&key), "{} -> {}", name, key);
        }
    }

    #[test]
    fn test_timestamped_filename() {
        let now = Local.with_ymd_and_hms(2026, 10, 19, 8, 5, 3).unwrap();
        assert_eq!(
            timestamped_filename(now, "river.png"),
            "20261019080503_river.png"
        );
    }

    #[test]
    fn test_random_suffix_keeps_extension() {
        let name = with_random_suffix("20261019080503_river.png");
        assert!(name.starts_with("20261019080503_river_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "20261019080503_river.png".len() + SUFFIX_LEN + 1);
    }
}
