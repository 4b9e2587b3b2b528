//! Registering a secret from an `otpauth://totp/...` QR code image.
//!
//! Nothing is written to either store until the final `add_entry`.

use crate::error::{Error, Result};
use crate::index::NameIndex;
use crate::manager::EntryManager;
use crate::prompt::Prompt;
use crate::secret::{self, Secret};
use crate::store::SecretStore;

use image::{imageops, GrayImage, Luma};
use std::path::Path;
use url::Url;

/// Margin added around the image when it is a bare code.
const QUIET_ZONE: u32 = 16;

#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeOptions {
    /// The image holds nothing but the code, edge to edge, with no quiet
    /// zone around it.
    pub pure_barcode: bool,
}

/// Decodes the first QR code found in the image file at `path`.
pub fn decode_qr_file<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<String> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|e| Error::decode(format!("{}: {}", path.display(), e)))?
        .to_luma8();
    decode_qr(image, options)
}

pub fn decode_qr(image: GrayImage, options: DecodeOptions) -> Result<String> {
    let image = if options.pure_barcode {
        with_quiet_zone(&image)
    } else {
        image
    };
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    let grid = grids
        .first()
        .ok_or_else(|| Error::decode("No QR code found in image"))?;
    let (_meta, content) = grid
        .decode()
        .map_err(|e| Error::decode(format!("Failed to decode QR code: {}", e)))?;
    debug!(grids = grids.len(), "decoded QR code");
    Ok(content)
}

fn with_quiet_zone(image: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::from_pixel(
        image.width() + 2 * QUIET_ZONE,
        image.height() + 2 * QUIET_ZONE,
        Luma([255]),
    );
    imageops::overlay(&mut padded, image, i64::from(QUIET_ZONE), i64::from(QUIET_ZONE));
    padded
}

/// Pulls the normalized secret out of an `otpauth://totp/...` URI.
pub fn parse_otpauth(text: &str) -> Result<Secret> {
    let url = Url::parse(text).map_err(|e| Error::decode(format!("Invalid URI: {}", e)))?;
    if url.scheme() != "otpauth" || url.host_str() != Some("totp") {
        return Err(Error::decode("Given QR code is not for TOTP"));
    }
    let raw = url
        .query_pairs()
        .find(|(key, _)| key == "secret")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();
    secret::normalize(&raw)
}

/// Decodes, validates, picks a free name starting from `name` and stores
/// the secret. Returns the name it was stored under.
pub fn import_qr_file<S, I, P>(
    manager: &EntryManager<S, I>,
    name: &str,
    path: &Path,
    options: DecodeOptions,
    prompt: &mut P,
) -> Result<String>
where
    S: SecretStore,
    I: NameIndex,
    P: Prompt + ?Sized,
{
    let text = decode_qr_file(path, options)?;
    import_text(manager, name, &text, prompt)
}

pub fn import_text<S, I, P>(
    manager: &EntryManager<S, I>,
    name: &str,
    text: &str,
    prompt: &mut P,
) -> Result<String>
where
    S: SecretStore,
    I: NameIndex,
    P: Prompt + ?Sized,
{
    let secret = parse_otpauth(text)?;
    let name = manager.resolve_name(name, prompt)?;
    manager.add_entry(&name, &secret)?;
    Ok(name)
}
