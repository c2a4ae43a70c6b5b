use std::fs::File;
use std::io::{prelude::*, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use gifseq::parser::{blue, green, red, Argb};

const MAGIC_NUMBER: &[u8] = b"P3";

/// Writes a composited canvas as a plain-text PPM image. Alpha is dropped, so
/// transparent pixels come out black.
pub fn write_ppm(filename: &Path, width: u16, height: u16, pixels: &[Argb]) -> Result<()> {
    let file = File::create(filename)
        .with_context(|| format!("failed to create {}", filename.display()))?;
    let mut writer = BufWriter::new(file);
    write_pixels(&mut writer, width, height, pixels)?;
    writer.flush()?;
    Ok(())
}

fn write_pixels(writer: &mut impl Write, width: u16, height: u16, pixels: &[Argb]) -> Result<()> {
    writer.write_all(MAGIC_NUMBER)?;
    writer.write_all(b"\n")?;
    writer.write_all(format!("{} {}", width, height).as_bytes())?;
    writer.write_all(b" 255")?;
    writer.write_all(b"\n")?;

    if width == 0 {
        return Ok(());
    }
    for row in pixels.chunks(width.into()) {
        let line = row
            .iter()
            .map(|&color| format!("{: >3} {: >3} {: >3}", red(color), green(color), blue(color)))
            .collect::<Vec<_>>()
            .join(" ");
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
