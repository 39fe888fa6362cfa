//! Domain models for the watermarking pipeline

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::AppError;

/// Kind of asset being watermarked. Supplied by the caller, never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
    #[serde(rename = "3d")]
    ThreeD,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Image => "image",
            AssetType::Video => "video",
            AssetType::ThreeD => "3d",
        }
    }

    /// MIME class the primary asset must declare, if any
    pub fn expected_asset_class(&self) -> Option<&'static str> {
        match self {
            AssetType::Image => Some("image"),
            AssetType::Video => Some("video"),
            AssetType::ThreeD => None,
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(AssetType::Image),
            "video" => Ok(AssetType::Video),
            "3d" => Ok(AssetType::ThreeD),
            other => Err(AppError::UnsupportedType(other.to_string())),
        }
    }
}

/// Multipart field an upload arrived in. Each kind has its own upload directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Media,
    Logo,
}

impl FieldKind {
    /// Multipart field name
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldKind::Media => "file",
            FieldKind::Logo => "logo",
        }
    }
}

/// Where the bytes of an upload live while the request runs
#[derive(Debug, Clone)]
pub enum Residency {
    Disk(PathBuf),
    Memory(Bytes),
}

/// An upload owned by exactly one request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: FieldKind,
    /// Untrusted; only ever used for its extension and for logging
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    pub residency: Residency,
}

impl UploadedFile {
    /// Normalized MIME type without parameters, lowercased
    pub fn mime_type(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default()
    }

    /// Top-level media class of the declared MIME type ("image" for "image/png")
    pub fn mime_class(&self) -> String {
        self.mime_type()
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Lowercased extension of the original filename, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Filesystem location when the upload is disk-backed
    pub fn location(&self) -> Option<&Path> {
        match &self.residency {
            Residency::Disk(path) => Some(path.as_path()),
            Residency::Memory(_) => None,
        }
    }

    /// Load the payload regardless of residency
    pub async fn read_bytes(&self) -> std::io::Result<Bytes> {
        match &self.residency {
            Residency::Disk(path) => tokio::fs::read(path).await.map(Bytes::from),
            Residency::Memory(data) => Ok(data.clone()),
        }
    }
}

/// Input to the composition engine
#[derive(Debug, Clone)]
pub struct CompositionRequest {
    pub asset: UploadedFile,
    pub logo: UploadedFile,
    pub asset_type: AssetType,
}

impl CompositionRequest {
    /// Input locations that must be removed by cleanup
    pub fn input_locations(&self) -> Vec<PathBuf> {
        [&self.asset, &self.logo]
            .iter()
            .filter_map(|f| f.location().map(Path::to_path_buf))
            .collect()
    }
}

/// Output of the composition engine
#[derive(Debug, Clone)]
pub struct CompositionResult {
    pub asset_type: AssetType,
    pub unique_id: String,
    pub extension: String,
    pub content_type: String,
    pub data: Bytes,
}

impl CompositionResult {
    /// Download filename hint: `domin8_<uniqueId>.<ext>`
    pub fn output_filename(&self) -> String {
        format!("domin8_{}.{}", self.unique_id, self.extension)
    }
}

/// Content type served for a produced file, keyed by its extension
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "glb" => "model/gltf-binary",
        "gltf" => "model/gltf+json",
        "obj" => "model/obj",
        "stl" => "model/stl",
        "usdz" => "model/vnd.usdz+zip",
        _ => "application/octet-stream",
    }
}

/// A persisted output as exposed by the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOutputEntry {
    pub name: String,
    pub url: String,
}

/// Whether inputs and outputs touch the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Inputs are saved to upload dirs and outputs persisted to the output dir
    Persistent,
    /// Everything stays in memory; nothing is persisted
    Transient,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "persistent" => Ok(StorageMode::Persistent),
            "transient" | "memory" => Ok(StorageMode::Transient),
            other => Err(format!("unknown storage mode '{}'", other)),
        }
    }
}

/// Anchor of the logo on a raster asset, named after compass gravity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Center,
}

impl Placement {
    /// Top-left corner of an overlay of size `overlay` on a base of size `base`.
    /// The overlay must fit inside the base.
    pub fn origin(&self, base: (u32, u32), overlay: (u32, u32)) -> (i64, i64) {
        let free_x = base.0.saturating_sub(overlay.0) as i64;
        let free_y = base.1.saturating_sub(overlay.1) as i64;
        let (fx, fy) = match self {
            Placement::North => (1, 0),
            Placement::NorthEast => (2, 0),
            Placement::East => (2, 1),
            Placement::SouthEast => (2, 2),
            Placement::South => (1, 2),
            Placement::SouthWest => (0, 2),
            Placement::West => (0, 1),
            Placement::NorthWest => (0, 0),
            Placement::Center => (1, 1),
        };
        (free_x * fx / 2, free_y * fy / 2)
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        match normalized.as_str() {
            "north" | "top" => Ok(Placement::North),
            "northeast" | "topright" => Ok(Placement::NorthEast),
            "east" | "right" => Ok(Placement::East),
            "southeast" | "bottomright" => Ok(Placement::SouthEast),
            "south" | "bottom" => Ok(Placement::South),
            "southwest" | "bottomleft" => Ok(Placement::SouthWest),
            "west" | "left" => Ok(Placement::West),
            "northwest" | "topleft" => Ok(Placement::NorthWest),
            "center" | "centre" => Ok(Placement::Center),
            _ => Err(format!("unknown placement '{}'", s)),
        }
    }
}

/// An opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parses `#rrggbb` or `rrggbb`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid colour '{}', expected #rrggbb", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("invalid colour: {}", e))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: &str) -> UploadedFile {
        UploadedFile {
            field: FieldKind::Media,
            original_filename: name.to_string(),
            content_type: content_type.to_string(),
            size: 3,
            residency: Residency::Memory(Bytes::from_static(b"abc")),
        }
    }

    #[test]
    fn test_asset_type_parsing() {
        assert_eq!("image".parse::<AssetType>().unwrap(), AssetType::Image);
        assert_eq!("VIDEO".parse::<AssetType>().unwrap(), AssetType::Video);
        assert_eq!("3d".parse::<AssetType>().unwrap(), AssetType::ThreeD);
        assert!(matches!(
            "audio".parse::<AssetType>(),
            Err(AppError::UnsupportedType(tag)) if tag == "audio"
        ));
    }

    #[test]
    fn test_mime_class_ignores_parameters() {
        let file = upload("photo.JPG", "Image/JPEG; charset=binary");
        assert_eq!(file.mime_type(), "image/jpeg");
        assert_eq!(file.mime_class(), "image");
        assert_eq!(file.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn test_memory_upload_has_no_location() {
        let file = upload("a.glb", "model/gltf-binary");
        assert!(file.location().is_none());
    }

    #[test]
    fn test_output_filename() {
        let result = CompositionResult {
            asset_type: AssetType::Image,
            unique_id: "1700000000000-abc123".to_string(),
            extension: "png".to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::new(),
        };
        assert_eq!(result.output_filename(), "domin8_1700000000000-abc123.png");
    }

    #[test]
    fn test_placement_origin() {
        let base = (640, 480);
        let logo = (64, 64);
        assert_eq!(Placement::West.origin(base, logo), (0, 208));
        assert_eq!(Placement::SouthEast.origin(base, logo), (576, 416));
        assert_eq!(Placement::NorthWest.origin(base, logo), (0, 0));
        assert_eq!(Placement::Center.origin(base, logo), (288, 208));
    }

    #[test]
    fn test_placement_aliases() {
        assert_eq!("west".parse::<Placement>().unwrap(), Placement::West);
        assert_eq!("south-east".parse::<Placement>().unwrap(), Placement::SouthEast);
        assert_eq!("bottom_right".parse::<Placement>().unwrap(), Placement::SouthEast);
        assert!("middle".parse::<Placement>().is_err());
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("PNG"), "image/png");
        assert_eq!(content_type_for_extension("glb"), "model/gltf-binary");
        assert_eq!(content_type_for_extension("enc"), "application/octet-stream");
    }

    #[test]
    fn test_rgb_parsing() {
        assert_eq!("#ffffff".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("00ff7f".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 127));
        assert!("#fff".parse::<Rgb>().is_err());
        assert!("#gggggg".parse::<Rgb>().is_err());
    }
}
