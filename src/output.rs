// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Getting the finished image out: as a grayscale PGM, or as a matrix
//! of counts.

use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::assemble::ResultBuffer;
use crate::kernel::Count;

/// Scales counts into 0..=255, with `max_iterations` (points that
/// never escaped) at full white.
pub fn grayscale(image: &ResultBuffer, max_iterations: Count) -> Vec<u8> {
    let max = u32::from(max_iterations.max(1));
    image
        .pixels()
        .iter()
        .map(|&count| ((u32::from(count).min(max) * 255) / max) as u8)
        .collect()
}

/// Writes the image as a binary PGM.
pub fn write_image<P: AsRef<Path>>(
    path: P,
    image: &ResultBuffer,
    max_iterations: Count,
) -> Result<(), io::Error> {
    let pixels = grayscale(image, max_iterations);
    let output = File::create(path)?;
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary));
    encoder.encode(&pixels[..], image.width(), image.height(), ColorType::Gray(8))?;
    Ok(())
}

/// Writes the counts one row per line, tab separated.
pub fn print_matrix<W: Write>(out: &mut W, image: &ResultBuffer) -> io::Result<()> {
    writeln!(out)?;
    for row in image.rows() {
        for count in row {
            write!(out, "{}\t", count)?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}
