use crate::PlateFormat;
use thiserror::Error;

/// Screen-space rectangle of the rendered plate, in logical points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything the rasterizer needs: where to crop and what to call the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub region: Region,
    pub include_legend: bool,
    pub file_name: String,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("the plate is not on screen yet, nothing to export")]
    RegionUnavailable,
    #[error("rendering the plate image failed: {0}")]
    Rasterize(String),
}

/// External capability that turns a screen region into encoded image bytes.
/// The GUI backs this with a viewport screenshot; tests use a stub.
pub trait Rasterizer {
    fn rasterize(&mut self, request: &ExportRequest) -> anyhow::Result<Vec<u8>>;
}

/// Decides what gets exported: the active plate's region (legend folded in
/// when requested by the caller, who knows both rectangles) and an image
/// name derived from the plate size. Fails when the view could not supply a
/// region; no state is touched either way.
pub fn request(
    format: PlateFormat,
    region: Option<Region>,
    include_legend: bool,
) -> Result<ExportRequest, ExportError> {
    let region = region.ok_or(ExportError::RegionUnavailable)?;
    Ok(ExportRequest {
        region,
        include_legend,
        file_name: format!("plate-{}-well.png", format.size()),
    })
}

/// Runs one export end to end against a rasterizer. Failures are surfaced
/// once for the user to retry manually; nothing is retried here.
pub fn run(
    format: PlateFormat,
    region: Option<Region>,
    include_legend: bool,
    rasterizer: &mut dyn Rasterizer,
) -> Result<Vec<u8>, ExportError> {
    let req = request(format, region, include_legend)?;
    rasterizer
        .rasterize(&req)
        .map_err(|e| ExportError::Rasterize(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubRasterizer {
        fail: bool,
        seen: Option<ExportRequest>,
    }

    impl Rasterizer for StubRasterizer {
        fn rasterize(&mut self, request: &ExportRequest) -> anyhow::Result<Vec<u8>> {
            self.seen = Some(request.clone());
            if self.fail {
                anyhow::bail!("gpu readback failed");
            }
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
    }

    fn region() -> Region {
        Region {
            x: 10.0,
            y: 20.0,
            width: 640.0,
            height: 480.0,
        }
    }

    #[test]
    fn file_name_follows_the_plate_size() {
        let req = request(PlateFormat::W96, Some(region()), true).unwrap();
        assert_eq!(req.file_name, "plate-96-well.png");
        assert!(req.include_legend);

        let req = request(PlateFormat::W6, Some(region()), false).unwrap();
        assert_eq!(req.file_name, "plate-6-well.png");
    }

    #[test]
    fn missing_region_is_a_recoverable_error() {
        let err = request(PlateFormat::W24, None, false).unwrap_err();
        assert!(matches!(err, ExportError::RegionUnavailable));
    }

    #[test]
    fn run_hands_the_request_to_the_rasterizer() {
        let mut raster = StubRasterizer { fail: false, seen: None };
        let bytes = run(PlateFormat::W48, Some(region()), true, &mut raster).unwrap();
        assert!(!bytes.is_empty());

        let seen = raster.seen.unwrap();
        assert_eq!(seen.region, region());
        assert_eq!(seen.file_name, "plate-48-well.png");
    }

    #[test]
    fn rasterizer_failure_surfaces_once() {
        let mut raster = StubRasterizer { fail: true, seen: None };
        let err = run(PlateFormat::W48, Some(region()), false, &mut raster).unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(_)));
    }
}
