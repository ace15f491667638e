//! Distributable widget packages: a zip holding `widget.json` (the project
//! document) and a static `index.html` manifest page.

use crate::codec;
use crate::error::CodecError;
use crate::scene::SceneGraph;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const MANIFEST_NAME: &str = "widget.json";
pub const INDEX_NAME: &str = "index.html";

/// Placeholder page shipped next to the manifest.
pub const INDEX_HTML: &str = "<!DOCTYPE html><html><body><h1>WGT Export</h1>\
<p>Widget Structure Ready.</p></body></html>";

/// Write a package to `writer` and hand the writer back.
pub fn export_package<W: Write + Seek>(scene: &SceneGraph, writer: W) -> Result<W, CodecError> {
    let manifest = codec::save(scene)?;
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    zip.start_file(MANIFEST_NAME, options)?;
    zip.write_all(&manifest)?;
    zip.start_file(INDEX_NAME, options)?;
    zip.write_all(INDEX_HTML.as_bytes())?;

    let writer = zip.finish()?;
    log::debug!("exported package with {} widgets", scene.widget_count());
    Ok(writer)
}

/// Extract a package into a scratch directory and load its manifest.
pub fn import_package<R: Read + Seek>(reader: R) -> Result<SceneGraph, CodecError> {
    let mut archive = ZipArchive::new(reader)?;
    let scratch = tempfile::tempdir()?;
    archive.extract(scratch.path())?;

    let manifest = scratch.path().join(MANIFEST_NAME);
    if !manifest.is_file() {
        return Err(CodecError::ManifestNotFound);
    }
    codec::load_file(&manifest)
}

pub fn export_package_file(scene: &SceneGraph, path: impl AsRef<Path>) -> Result<(), CodecError> {
    let file = File::create(path)?;
    export_package(scene, file)?;
    Ok(())
}

pub fn import_package_file(path: impl AsRef<Path>) -> Result<SceneGraph, CodecError> {
    import_package(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;
    use std::io::Cursor;

    #[test]
    fn package_contains_manifest_and_index() {
        let mut scene = SceneGraph::new();
        let root = scene.root_id();
        scene.create(NodeKind::Clock, 10, 10, root).unwrap();

        let bytes = export_package(&scene, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        let mut archive = ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec![INDEX_NAME, MANIFEST_NAME]);

        let mut html = String::new();
        archive
            .by_name(INDEX_NAME)
            .unwrap()
            .read_to_string(&mut html)
            .unwrap();
        assert_eq!(html, INDEX_HTML);

        let loaded = import_package(Cursor::new(bytes)).unwrap();
        assert_eq!(loaded.widget_count(), 1);
    }

    #[test]
    fn missing_manifest_is_reported() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(INDEX_NAME, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(INDEX_HTML.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = import_package(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, CodecError::ManifestNotFound), "{err}");
    }

    #[test]
    fn garbage_is_an_archive_error() {
        let err = import_package(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, CodecError::Archive(_)), "{err}");
    }
}
