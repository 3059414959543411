//! Content-driven sizing.
//!
//! Markup is measured by attaching it to an off-screen scratch container
//! and reading back its natural size. The scratch node is always detached,
//! whether reading succeeded or not.

use fg_core::config::{AutoFitConfig, CanvasConfig};
use fg_core::geometry::SizeBounds;
use fg_core::Size;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("could not attach scratch container: {0}")]
    Attach(String),
    #[error("could not read natural size: {0}")]
    Read(String),
}

/// Somewhere markup can be laid out invisibly.
pub trait ScratchSurface {
    type Node;

    /// Attach sanitized markup in an off-screen container.
    fn attach(&mut self, markup: &str) -> Result<Self::Node, MeasureError>;

    /// Natural (unconstrained) size of an attached container.
    fn natural_size(&self, node: &Self::Node) -> Result<Size, MeasureError>;

    /// Remove the container. Must not fail.
    fn detach(&mut self, node: Self::Node);
}

/// Attach, read and detach. The node is detached on every path after a
/// successful attach.
pub fn measure_scoped<S: ScratchSurface + ?Sized>(surface: &mut S, markup: &str) -> Result<Size, MeasureError> {
    let node = surface.attach(markup)?;
    let size = surface.natural_size(&node);
    surface.detach(node);
    size
}

#[derive(Debug, Clone, Copy)]
pub struct AutoFit {
    bounds: SizeBounds,
    settings: AutoFitConfig,
}

impl AutoFit {
    pub fn new(bounds: SizeBounds, settings: AutoFitConfig) -> Self {
        Self { bounds, settings }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.bounds, config.auto_fit)
    }

    pub fn settle_delay_ms(&self) -> f64 {
        self.settings.settle_delay_ms
    }

    /// Measured size clamped to bounds.
    pub fn measure<S: ScratchSurface + ?Sized>(&self, surface: &mut S, markup: &str) -> Result<Size, MeasureError> {
        measure_scoped(surface, markup).map(|size| self.bounds.clamp(size))
    }

    /// New size for a component currently sized `current`, or `None` when
    /// the difference is within the threshold on both axes or measuring
    /// failed.
    pub fn fit<S: ScratchSurface + ?Sized>(&self, surface: &mut S, markup: &str, current: Size) -> Option<Size> {
        match self.measure(surface, markup) {
            Ok(size) => {
                let dw = (size.width - current.width).abs();
                let dh = (size.height - current.height).abs();
                (dw > self.settings.threshold || dh > self.settings.threshold).then_some(size)
            }
            Err(err) => {
                log::warn!("auto-fit: {err}, keeping {}x{}", current.width, current.height);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scratch surface with a fixed answer that records attach/detach.
    struct FakeSurface {
        answer: Result<Size, &'static str>,
        fail_attach: bool,
        attached: Vec<u32>,
        next: u32,
        last_markup: String,
    }

    impl FakeSurface {
        fn new(answer: Result<Size, &'static str>) -> Self {
            Self {
                answer,
                fail_attach: false,
                attached: Vec::new(),
                next: 0,
                last_markup: String::new(),
            }
        }
    }

    impl ScratchSurface for FakeSurface {
        type Node = u32;

        fn attach(&mut self, markup: &str) -> Result<u32, MeasureError> {
            if self.fail_attach {
                return Err(MeasureError::Attach("no body".into()));
            }
            self.last_markup = markup.to_string();
            self.next += 1;
            self.attached.push(self.next);
            Ok(self.next)
        }

        fn natural_size(&self, _node: &u32) -> Result<Size, MeasureError> {
            self.answer.map_err(|e| MeasureError::Read(e.into()))
        }

        fn detach(&mut self, node: u32) {
            self.attached.retain(|n| *n != node);
        }
    }

    fn fitter() -> AutoFit {
        AutoFit::new(SizeBounds::default(), AutoFitConfig::default())
    }

    #[test]
    fn measure_detaches_on_success_and_failure() {
        let mut ok = FakeSurface::new(Ok(Size::new(420.0, 260.0)));
        assert_eq!(measure_scoped(&mut ok, "<p>x</p>").ok(), Some(Size::new(420.0, 260.0)));
        assert!(ok.attached.is_empty());
        assert_eq!(ok.last_markup, "<p>x</p>");

        let mut broken = FakeSurface::new(Err("layout unavailable"));
        assert!(matches!(measure_scoped(&mut broken, "<p>x</p>"), Err(MeasureError::Read(_))));
        assert!(broken.attached.is_empty());
    }

    #[test]
    fn fit_clamps_measurement() {
        let mut huge = FakeSurface::new(Ok(Size::new(2000.0, 10.0)));
        assert_eq!(
            fitter().fit(&mut huge, "", Size::new(300.0, 200.0)),
            Some(Size::new(800.0, 80.0))
        );
    }

    #[test]
    fn tiny_content_fits_to_minimum() {
        let mut tiny = FakeSurface::new(Ok(Size::new(10.0, 10.0)));
        assert_eq!(
            fitter().fit(&mut tiny, "<span>.</span>", Size::new(300.0, 200.0)),
            Some(Size::new(100.0, 80.0))
        );
        let mut huge = FakeSurface::new(Ok(Size::new(2000.0, 2000.0)));
        assert_eq!(
            fitter().fit(&mut huge, "", Size::new(300.0, 200.0)),
            Some(Size::new(800.0, 600.0))
        );
    }

    #[test]
    fn fit_ignores_small_changes() {
        let mut close = FakeSurface::new(Ok(Size::new(304.0, 195.0)));
        assert_eq!(fitter().fit(&mut close, "", Size::new(300.0, 200.0)), None);
        let mut one_axis = FakeSurface::new(Ok(Size::new(304.0, 206.0)));
        assert_eq!(
            fitter().fit(&mut one_axis, "", Size::new(300.0, 200.0)),
            Some(Size::new(304.0, 206.0))
        );
    }

    #[test]
    fn fit_failure_keeps_size() {
        let mut surface = FakeSurface::new(Ok(Size::new(500.0, 500.0)));
        surface.fail_attach = true;
        assert_eq!(fitter().fit(&mut surface, "", Size::new(300.0, 200.0)), None);
    }
}
