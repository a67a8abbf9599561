//! QR code images pointing voters at the ballot.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode;

use crate::error::Error;

/// Pixel size of one QR module.
const MODULE_PX: u32 = 8;

/// Encode `data` as a black-on-white PNG.
pub fn render_png(data: &str) -> Result<Vec<u8>, Error> {
  let code = QrCode::new(data.as_bytes()).map_err(|e| Error::Qr(e.to_string()))?;
  let img = code
    .render::<Luma<u8>>()
    .module_dimensions(MODULE_PX, MODULE_PX)
    .build();

  let mut out = Cursor::new(Vec::new());
  img
    .write_to(&mut out, ImageFormat::Png)
    .map_err(|e| Error::Qr(e.to_string()))?;
  Ok(out.into_inner())
}

/// Absolute ballot URL for a candidate.
pub fn vote_url(base_url: &str, candidate_id: i64) -> String {
  format!("{}/vote/{candidate_id}", base_url.trim_end_matches('/'))
}
