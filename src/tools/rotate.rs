//! Page rotation for landscape output.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{ToolError, Toolchain};

/// How every page is turned, in pdftk's vocabulary.
///
/// Compass directions set the page rotation absolutely; `Left` and `Right`
/// turn pages relative to their current rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Pages face east (90°)
    #[default]
    East,
    /// Pages face north (0°, upright)
    North,
    /// 90° clockwise from the current rotation
    Right,
    /// 90° counter-clockwise from the current rotation
    Left,
}

impl Rotation {
    fn as_str(self) -> &'static str {
        match self {
            Rotation::East => "east",
            Rotation::North => "north",
            Rotation::Right => "right",
            Rotation::Left => "left",
        }
    }

    /// Page range spec covering the whole document
    pub fn page_spec(self) -> String {
        format!("1-end{}", self.as_str())
    }

    /// The rotation that brings an upright document back to upright
    pub fn inverse(self) -> Self {
        match self {
            Rotation::East => Rotation::North,
            Rotation::North => Rotation::North,
            Rotation::Right => Rotation::Left,
            Rotation::Left => Rotation::Right,
        }
    }
}

/// Rotate every page of `pdf` in place.
///
/// The unrotated file is kept as `<name>.pdf.bak`; its path is returned.
pub fn rotate_pdf(
    pdf: &Path,
    rotation: Rotation,
    toolchain: &Toolchain,
) -> Result<PathBuf, ToolError> {
    let backup = pdf.with_extension("pdf.bak");
    std::fs::rename(pdf, &backup)?;
    tracing::info!("Rotating pages ({})...", rotation.as_str());

    let mut command = Command::new(&toolchain.rotator);
    command
        .arg(&backup)
        .arg("rotate")
        .arg(rotation.page_spec())
        .arg("output")
        .arg(pdf)
        .stdin(Stdio::null())
        .stdout(toolchain.child_stdout())
        .stderr(toolchain.child_stderr());

    let status = command.status().map_err(|source| ToolError::Spawn {
        tool: toolchain.rotator.clone(),
        source,
    })?;

    if !status.success() {
        return Err(ToolError::Failed {
            tool: toolchain.rotator.clone(),
            status: status.to_string(),
        });
    }
    if !pdf.is_file() {
        return Err(ToolError::MissingOutput(pdf.to_path_buf()));
    }

    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::is_command_available;
    use lopdf::{dictionary, Document, Object, Stream};
    use tempfile::tempdir;

    /// Write an N-page PDF with no /Rotate entries
    fn write_pdf(path: &Path, pages: usize) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 288.into(), 432.into()],
                    "Contents" => content_id,
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    /// /Rotate of every page, normalized to 0..360
    fn page_rotations(path: &Path) -> Vec<i64> {
        let doc = Document::load(path).unwrap();
        doc.get_pages()
            .values()
            .map(|&id| {
                let page = doc.get_dictionary(id).unwrap();
                let rotate = page
                    .get(b"Rotate")
                    .ok()
                    .and_then(|o| o.as_i64().ok())
                    .unwrap_or(0);
                rotate.rem_euclid(360)
            })
            .collect()
    }

    #[test]
    fn test_page_spec() {
        assert_eq!(Rotation::East.page_spec(), "1-endeast");
        assert_eq!(Rotation::Left.page_spec(), "1-endleft");
        assert_eq!(Rotation::East.inverse(), Rotation::North);
        assert_eq!(Rotation::Right.inverse(), Rotation::Left);
    }

    #[test]
    fn test_missing_rotator_keeps_backup() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("paper.pdf");
        std::fs::write(&pdf, b"%PDF-1.5\n").unwrap();

        let toolchain = Toolchain {
            rotator: "arxiv2kindle-no-such-rotator".to_string(),
            ..Toolchain::default()
        };
        let result = rotate_pdf(&pdf, Rotation::East, &toolchain);

        assert!(matches!(result, Err(ToolError::Spawn { .. })));
        assert!(dir.path().join("paper.pdf.bak").is_file());
    }

    fn round_trip(rotation: Rotation, rotated: i64) {
        if !is_command_available("pdftk") {
            return;
        }
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("paper.pdf");
        write_pdf(&pdf, 3);
        assert_eq!(page_rotations(&pdf), vec![0, 0, 0]);

        let toolchain = Toolchain {
            echo_output: false,
            ..Toolchain::default()
        };

        rotate_pdf(&pdf, rotation, &toolchain).unwrap();
        assert_eq!(page_rotations(&pdf), vec![rotated; 3]);
        assert_eq!(page_rotations(&dir.path().join("paper.pdf.bak")), vec![0, 0, 0]);

        rotate_pdf(&pdf, rotation.inverse(), &toolchain).unwrap();
        assert_eq!(page_rotations(&pdf), vec![0, 0, 0]);
    }

    /// `path` spelled relative to the current directory
    fn relative_to_cwd(path: &Path) -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        relative.join(path.components().skip(1).collect::<PathBuf>())
    }

    #[test]
    fn test_rotate_relative_path() {
        if !is_command_available("pdftk") {
            return;
        }
        let dir = tempdir().unwrap();
        let pdf = relative_to_cwd(&dir.path().join("paper.pdf"));
        assert!(pdf.is_relative());
        write_pdf(&pdf, 2);

        let toolchain = Toolchain {
            echo_output: false,
            ..Toolchain::default()
        };
        let backup = rotate_pdf(&pdf, Rotation::East, &toolchain).unwrap();

        assert_eq!(backup, pdf.with_extension("pdf.bak"));
        assert!(dir.path().join("paper.pdf.bak").is_file());
        assert_eq!(page_rotations(&dir.path().join("paper.pdf")), vec![90, 90]);
    }

    #[test]
    fn test_landscape_round_trip() {
        round_trip(Rotation::East, 90);
    }

    #[test]
    fn test_relative_round_trip() {
        round_trip(Rotation::Right, 90);
        round_trip(Rotation::Left, 270);
    }
}
