use std::{
    io::{BufWriter, Write},
    path::Path,
};

use sha1::{Digest, Sha1};

use crate::{
    config::ConversionConfig,
    encode::{encode_coord_line, encode_data_line_with},
    error::{MsiError, Result},
    reader::Record,
};

/// passes bytes through to the inner writer while feeding them to a SHA-1 digest
pub struct HashingWriter<W: Write> {
    inner: W,
    sh: Sha1,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> HashingWriter<W> { HashingWriter { inner, sh: Sha1::default() } }

    /// flushes and hands back the inner writer along with the hex digest of everything written
    pub fn finish(mut self) -> Result<(W, String)> {
        self.inner.flush()?;
        let digest = self.sh.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        Ok((self.inner, digest))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.sh.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> { self.inner.flush() }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamDigests {
    pub lines: usize,
    pub spectra_sha1: String,
    pub coords_sha1: String,
}

/// Splits each record into its spectrum line and its coordinate line and advances both
/// streams together. Both lines are encoded before either is written so an encoding
/// failure never leaves one stream a line ahead of the other.
pub struct RecordWriter<S: Write, C: Write> {
    spectra: HashingWriter<S>,
    coords: HashingWriter<C>,
    config: ConversionConfig,
    lines: usize,
}

impl<S: Write, C: Write> RecordWriter<S, C> {
    pub fn new(spectra: S, coords: C, config: ConversionConfig) -> RecordWriter<S, C> {
        RecordWriter {
            spectra: HashingWriter::new(spectra),
            coords: HashingWriter::new(coords),
            config,
            lines: 0,
        }
    }

    pub fn lines(&self) -> usize { self.lines }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        if record.index != self.lines {
            return Err(MsiError::Integrity(format!(
                "record {} arrived while line {} was expected",
                record.index, self.lines
            )));
        }
        let (mz, intensity) = (record.spectrum.mz(), record.spectrum.intensity());
        let data_line = encode_data_line_with(record.index, mz, intensity, &self.config)?;
        let coord_line = encode_coord_line(record.index, record.coord.x, record.coord.y);
        writeln!(self.spectra, "{data_line}")?;
        writeln!(self.coords, "{coord_line}")?;
        self.lines += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<(S, C, StreamDigests)> {
        let (spectra, spectra_sha1) = self.spectra.finish()?;
        let (coords, coords_sha1) = self.coords.finish()?;
        Ok((spectra, coords, StreamDigests { lines: self.lines, spectra_sha1, coords_sha1 }))
    }
}

/// saves the sampled-area mask as a 16-bit grayscale png: sampled pixels white, background black
pub fn save_mask_png(mask: &[bool], w: u32, h: u32, path: &Path) -> Result<()> {
    if mask.len() != (w as usize) * (h as usize) {
        let reason = format!("mask of {} pixels is not {} x {}", mask.len(), w, h);
        return Err(MsiError::Integrity(reason));
    }
    let data: Vec<u8> = mask
        .iter()
        .flat_map(|&m| (if m { u16::MAX } else { 0u16 }).to_be_bytes())
        .collect();
    let buf_writer = &mut BufWriter::new(std::fs::File::create(path)?);
    let mut encoder = png::Encoder::new(buf_writer, w, h);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Sixteen);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    Ok(())
}
