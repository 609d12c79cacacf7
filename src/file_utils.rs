use anyhow::{Context, Result};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::document::DocumentFormat;

// @module: File and directory utilities

/// Issues log written next to translated documents
pub const ISSUES_LOG_FILE: &str = "yadtwai.issues.log";

/// Local file header signature of a zip archive
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

// @pattern: `<stem>.<lang>` where lang is a 2-3 letter code, optionally with a region
static TRANSLATED_STEM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([A-Za-z]{2,3})(?:[-_][A-Za-z]{2})?$").unwrap());

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: `<stem>.<lang>.<ext>` for a translated document
    // @params: input_file, output_dir, target_language, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(target_language);
        output_filename.push('.');
        output_filename.push_str(extension.trim_start_matches('.'));
        output_dir.as_ref().join(output_filename)
    }

    // @returns: Supported documents under `dir`, sorted by path
    pub fn find_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            let hidden_or_lock = entry.file_name().to_string_lossy().starts_with(['.', '~']);
            if path.is_file() && !hidden_or_lock && DocumentFormat::from_path(path).is_some() {
                result.push(path.to_path_buf());
            }
        }
        Ok(result)
    }

    // @checks: Whether the file name already carries a language code before its extension
    pub fn is_translation_output<P: AsRef<Path>>(path: P) -> bool {
        let Some(stem) = path.as_ref().file_stem() else {
            return false;
        };
        let stem = stem.to_string_lossy();
        TRANSLATED_STEM_REGEX
            .captures(&stem)
            .and_then(|caps| caps.get(1))
            .is_some_and(|code| crate::language_utils::validate_language_code(code.as_str()).is_ok())
    }

    // @returns: Issues log path beside `output_file`
    pub fn issues_log_path<P: AsRef<Path>>(output_file: P) -> PathBuf {
        match output_file.as_ref().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(ISSUES_LOG_FILE),
            _ => PathBuf::from(ISSUES_LOG_FILE),
        }
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Classify a file by extension, falling back to the zip signature
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if let Some(format) = DocumentFormat::from_path(path) {
            return Ok(FileType::Document(format));
        }

        let mut magic = [0u8; 4];
        let mut file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
        if file.read_exact(&mut magic).is_ok() && &magic == ZIP_MAGIC {
            return Ok(FileType::Archive);
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Supported document, recognized by extension
    Document(DocumentFormat),
    /// Zip archive of unknown family; the pipeline may still detect it
    Archive,
    /// Anything else
    Unknown,
}
