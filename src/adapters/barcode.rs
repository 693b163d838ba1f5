use crate::domain::model::LicensePlate;
use crate::domain::ports::BarcodeRenderer;
use crate::utils::error::{CarwashError, Result};
use async_trait::async_trait;
use barcoders::generators::image::Image;
use barcoders::sym::code128::Code128;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Code 128 字元集 B 的起始字元（大小寫字母與數字）
const CHARSET_B: char = '\u{0181}';

pub const DEFAULT_BAR_HEIGHT: u32 = 80;

/// 將車牌條碼寫成 PNG，檔名就是車牌
#[derive(Debug, Clone)]
pub struct Code128Barcodes {
    dir: PathBuf,
    url_prefix: String,
    height: u32,
}

impl Code128Barcodes {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>, height: u32) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            height,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(plate: &LicensePlate) -> String {
        format!("{}.png", plate)
    }

    pub fn path_for(&self, plate: &LicensePlate) -> PathBuf {
        self.dir.join(Self::file_name(plate))
    }
}

pub fn encode_png(plate: &LicensePlate, height: u32) -> Result<Vec<u8>> {
    let data = format!("{}{}", CHARSET_B, plate);
    let barcode = Code128::new(data.as_str()).map_err(|e| CarwashError::BarcodeError {
        plate: plate.to_string(),
        message: format!("{:?}", e),
    })?;
    let encoded = barcode.encode();

    Image::png(height)
        .generate(&encoded[..])
        .map_err(|e| CarwashError::BarcodeError {
            plate: plate.to_string(),
            message: format!("{:?}", e),
        })
}

/// 先寫到同目錄的暫存檔再 rename，讀者不會看到寫到一半的圖
fn write_atomically(dir: &Path, target: &Path, data: &[u8]) -> Result<()> {
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(data)?;
    temp_file.flush()?;
    temp_file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl BarcodeRenderer for Code128Barcodes {
    async fn render(&self, plate: &LicensePlate) -> Result<String> {
        let plate = plate.clone();
        let dir = self.dir.clone();
        let target = self.path_for(&plate);
        let height = self.height;

        let file_name = tokio::task::spawn_blocking(move || {
            let png = encode_png(&plate, height)?;
            write_atomically(&dir, &target, &png)?;
            tracing::debug!("Barcode written to {} ({} bytes)", target.display(), png.len());
            Ok::<_, CarwashError>(Code128Barcodes::file_name(&plate))
        })
        .await??;

        Ok(file_name)
    }

    fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix, filename)
    }
}
