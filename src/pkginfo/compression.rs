//! Content-sniffed decompression for package containers.

use std::io::{self, BufRead, Read};

use super::error::PkginfoError;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];
const BZIP2_MAGIC: &[u8] = b"BZh";

/// Compression wrapped around the tar stream of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Xz,
    Zstd,
    Bzip2,
}

impl Compression {
    /// Identify the compression from the leading bytes of the file.
    /// Anything unrecognised is treated as a bare tar stream.
    pub fn detect(magic: &[u8]) -> Self {
        if magic.starts_with(XZ_MAGIC) {
            Compression::Xz
        } else if magic.starts_with(ZSTD_MAGIC) {
            Compression::Zstd
        } else if magic.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if magic.starts_with(BZIP2_MAGIC) {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }
}

/// Wrap `reader` in a streaming decoder chosen by sniffing its first bytes.
///
/// Decoders only pull compressed input on demand, so a caller that stops
/// reading early never pays for the rest of the stream.
pub fn decompress<'a, R: BufRead + 'a>(mut reader: R) -> Result<Box<dyn Read + 'a>, PkginfoError> {
    let compression = Compression::detect(reader.fill_buf()?);
    log::debug!("Detected package compression: {:?}", compression);

    let decoded: Box<dyn Read + 'a> = match compression {
        Compression::None => Box::new(reader),
        Compression::Gzip => Box::new(flate2::bufread::MultiGzDecoder::new(reader)),
        Compression::Xz => Box::new(xz2::bufread::XzDecoder::new_multi_decoder(reader)),
        Compression::Zstd => Box::new(zstd_decoder(reader)?),
        Compression::Bzip2 => return Err(PkginfoError::UnsupportedCompression("bzip2")),
    };
    Ok(decoded)
}

fn zstd_decoder<R: BufRead>(reader: R) -> io::Result<zstd::stream::read::Decoder<'static, R>> {
    zstd::stream::read::Decoder::with_buffer(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const PAYLOAD: &[u8] = b"not really a tar stream, just bytes";

    fn read_all(bytes: Vec<u8>) -> Vec<u8> {
        let mut out = Vec::new();
        decompress(Cursor::new(bytes))
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_detect() {
        assert_eq!(Compression::detect(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
        assert_eq!(
            Compression::detect(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x00]),
            Compression::Xz
        );
        assert_eq!(
            Compression::detect(&[0x28, 0xb5, 0x2f, 0xfd, 0x04]),
            Compression::Zstd
        );
        assert_eq!(Compression::detect(b"BZh91AY"), Compression::Bzip2);
        assert_eq!(Compression::detect(b".PKGINFO\0\0"), Compression::None);
        assert_eq!(Compression::detect(&[]), Compression::None);
    }

    #[test]
    fn test_decompress_plain_passthrough() {
        assert_eq!(read_all(PAYLOAD.to_vec()), PAYLOAD);
    }

    #[test]
    fn test_decompress_gzip() {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(PAYLOAD).unwrap();
        assert_eq!(read_all(enc.finish().unwrap()), PAYLOAD);
    }

    #[test]
    fn test_decompress_xz() {
        let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
        enc.write_all(PAYLOAD).unwrap();
        assert_eq!(read_all(enc.finish().unwrap()), PAYLOAD);
    }

    #[test]
    fn test_decompress_zstd() {
        let compressed = zstd::encode_all(PAYLOAD, 3).unwrap();
        assert_eq!(read_all(compressed), PAYLOAD);
    }

    #[test]
    fn test_decompress_bzip2_rejected() {
        let result = decompress(Cursor::new(b"BZh91AY&SY".to_vec()));
        assert!(matches!(
            result,
            Err(PkginfoError::UnsupportedCompression("bzip2"))
        ));
    }
}
