// Packs a decoded gist into a gzipped tarball, one entry per file under
// a directory named after the gist id.

use crate::error::Result;
use crate::model::Gist;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// Default archive name for a gist: `<id>.tar.gz`.
pub fn archive_name(gist: &Gist) -> String {
    format!("{}.tar.gz", gist.id)
}

/// Write `gist` as a `.tar.gz` stream into `writer` and hand the writer back.
pub fn write_archive<W: Write>(writer: W, gist: &Gist) -> Result<W> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for file in &gist.files {
        let data = file.text().as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();

        tar.append_data(&mut header, format!("{}/{}", gist.id, file.filename), data)?;
    }

    let enc = tar.into_inner()?;
    Ok(enc.finish()?)
}
