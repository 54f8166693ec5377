use crate::adapters::pixel_format::copy_rgba_to_rgb;
use crate::controllers::ports::file_presenter::FilePresenterPort;
use crate::core::data::pixel_buffer::{BYTES_PER_PIXEL, PixelBuffer};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Writes frames as binary PPM (P6), creating parent directories on demand.
#[derive(Debug, Clone, Copy)]
pub struct PpmFilePresenter {}

impl FilePresenterPort for PpmFilePresenter {
    fn present(&self, buffer: &PixelBuffer, filepath: impl AsRef<Path>) -> std::io::Result<()> {
        let filepath = filepath.as_ref();
        if let Some(parent) = filepath.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = BufWriter::new(File::create(filepath)?);
        write_ppm(&mut file, buffer)?;
        file.flush()?;

        info!(
            path = %filepath.display(),
            width = buffer.width(),
            height = buffer.height(),
            "frame written"
        );

        Ok(())
    }
}

impl Default for PpmFilePresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl PpmFilePresenter {
    pub fn new() -> Self {
        Self {}
    }
}

fn write_ppm(out: &mut impl Write, buffer: &PixelBuffer) -> std::io::Result<()> {
    let mut rgb = vec![0; buffer.buffer_size() / BYTES_PER_PIXEL * 3];
    copy_rgba_to_rgb(buffer.buffer(), &mut rgb);

    // P6 is binary RGB, followed by width, height and max colour value
    writeln!(out, "P6")?;
    writeln!(out, "{} {}", buffer.width(), buffer.height())?;
    writeln!(out, "255")?;
    out.write_all(&rgb)
}
