//! 画像ファイルの読み込みとフォルダスキャン

use crate::error::{LaundryError, Result};
use image::ImageFormat;
use laundry_advisor_common::SelectedImage;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// 画像ファイルを読み込み、MIMEタイプを判定
///
/// 内容から形式を判定し、判定できなければ拡張子を使う
pub fn load_image(path: &Path) -> Result<SelectedImage> {
    if !path.is_file() {
        return Err(LaundryError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(LaundryError::EmptyFile(path.display().to_string()));
    }

    let format = image::guess_format(&bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map_err(|_| LaundryError::UnsupportedFile(path.display().to_string()))?;

    let mime_type = format.to_mime_type();
    if !mime_type.starts_with("image/") {
        return Err(LaundryError::UnsupportedFile(path.display().to_string()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(SelectedImage::new(file_name, mime_type, bytes))
}

/// フォルダ内の画像をスキャン（ファイル名順）
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(LaundryError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_image_extension(p))
        .collect();

    images.sort();
    Ok(images)
}

/// コマンドライン引数のパスを画像ファイルのリストに展開
pub fn collect_inputs(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            let found = scan_folder(path, recursive)?;
            if found.is_empty() {
                return Err(LaundryError::NoImagesFound(path.display().to_string()));
            }
            inputs.extend(found);
        } else if path.exists() {
            inputs.push(path.clone());
        } else {
            return Err(LaundryError::FileNotFound(path.display().to_string()));
        }
    }

    Ok(inputs)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
