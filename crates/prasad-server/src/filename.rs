use chrono::{DateTime, Utc};
use prasad_shared::ImageCategory;
use uuid::Uuid;

/// Stored filename of the form
/// `{category}_{YYYYMMDD_HHMMSS}_{8 hex chars}{extension}`.
///
/// Uniqueness rests on the random suffix alone; storage is not consulted.
pub fn generate_filename(original_filename: &str, category: ImageCategory) -> String {
    generate_filename_at(original_filename, category, Utc::now())
}

pub fn generate_filename_at(
    original_filename: &str,
    category: ImageCategory,
    now: DateTime<Utc>,
) -> String {
    let timestamp = now.format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    let extension = file_extension(original_filename);
    format!("{}_{}_{}{}", category.as_str(), timestamp, &suffix[..8], extension)
}

/// Extension of the last path component, leading dot included. A name made
/// only of leading dots plus a stem (`.bashrc`) has no extension.
pub fn file_extension(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem_start = base.len() - base.trim_start_matches('.').len();
    match base[stem_start..].rfind('.') {
        Some(idx) => &base[stem_start + idx..],
        None => "",
    }
}
