//! Viewport scaling of the fixed slide canvas.
//!
//! Slides are authored against a fixed logical canvas (960×540 by default)
//! and shown in containers of arbitrary size. [`ScaleCalculator`] computes the
//! uniform factor fitting the canvas into a container; [`Scaler`] owns the
//! current factor for one visible slide view and tells subscribers whenever it
//! is written.
//!
//! ## Triggers
//!
//! The factor is recomputed on two events:
//!
//! - [`Scaler::on_resize`]: the container changed size.
//! - [`Scaler::content_settled`]: the slide finished loading asynchronous
//!   content (templates, images) that may have changed its intrinsic size.
//!   The last known container box is reused.
//!
//! Both are O(1) and idempotent. Rapid triggers overwrite the value; there is
//! no debouncing.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Default upper bound for the scale factor.
pub const DEFAULT_CEILING: f64 = 2.5;

// Relative slack for "fits" checks; `w / 960 * 960` may land one ulp above `w`.
const FIT_TOLERANCE: f64 = 1e-9;

/// Logical canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(960.0, 540.0)
    }
}

/// The box of the element hosting the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerBox {
    pub width: f64,
    pub height: f64,
}

impl ContainerBox {
    /// Creates a container box. Negative dimensions are clamped to zero.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: if width < 0.0 { 0.0 } else { width },
            height: if height < 0.0 { 0.0 } else { height },
        }
    }
}

fn fits(scaled: f64, available: f64) -> bool {
    scaled <= available + available.abs() * FIT_TOLERANCE
}

/// Computes the uniform scale fitting a canvas into a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleCalculator {
    pub canvas: CanvasSize,
    pub ceiling: f64,
}

impl Default for ScaleCalculator {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            ceiling: DEFAULT_CEILING,
        }
    }
}

impl ScaleCalculator {
    pub fn new(canvas: CanvasSize, ceiling: f64) -> Self {
        Self { canvas, ceiling }
    }

    /// Returns the scale factor for `container`.
    ///
    /// The checks run in a fixed order: the ceiling first, then the uniform
    /// candidate, then the per-axis factors, finally `1.0`. Non-finite input
    /// falls through every comparison and ends at `1.0`.
    ///
    /// ```rust
    /// use slidedeck_render::scale::{ContainerBox, ScaleCalculator};
    ///
    /// let calc = ScaleCalculator::default();
    /// assert_eq!(calc.compute(ContainerBox::new(1920.0, 1080.0)), 2.0);
    /// assert_eq!(calc.compute(ContainerBox::new(100_000.0, 100_000.0)), 2.5);
    /// ```
    pub fn compute(&self, container: ContainerBox) -> f64 {
        let CanvasSize { width: cw, height: ch } = self.canvas;
        let scale_w = container.width / cw;
        let scale_h = container.height / ch;
        // `f64::min` ignores NaN; a NaN axis has to poison the candidate.
        let candidate = if scale_w.is_nan() || scale_h.is_nan() {
            f64::NAN
        } else {
            scale_w.min(scale_h)
        };

        let fits_width = fits(candidate * cw, container.width);
        let fits_height = fits(candidate * ch, container.height);

        if candidate > self.ceiling {
            self.ceiling
        } else if fits_width && fits_height {
            candidate
        } else if fits_width {
            scale_w
        } else if fits_height {
            scale_h
        } else {
            1.0
        }
    }
}

/// Identifies a scale subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(f64) + Send + Sync>;

struct ScaleState {
    value: f64,
    container: Option<ContainerBox>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

/// Owns the scale factor of one slide view.
///
/// The value starts at `1.0`. Each write notifies every subscriber with the
/// new value; subscribers run outside the internal lock and may read
/// [`Scaler::current`].
pub struct Scaler {
    calculator: ScaleCalculator,
    variable: String,
    next_id: AtomicU64,
    state: Mutex<ScaleState>,
}

impl fmt::Debug for Scaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scaler")
            .field("calculator", &self.calculator)
            .field("variable", &self.variable)
            .field("value", &self.current())
            .finish()
    }
}

impl Scaler {
    pub fn new(calculator: ScaleCalculator, variable: impl Into<String>) -> Self {
        Self {
            calculator,
            variable: variable.into(),
            next_id: AtomicU64::new(0),
            state: Mutex::new(ScaleState {
                value: 1.0,
                container: None,
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScaleState> {
        // A panicking subscriber never runs under the lock, so poisoning only
        // means a panic elsewhere; the state itself is always consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The current scale factor.
    pub fn current(&self) -> f64 {
        self.lock().value
    }

    /// The last container box seen, if any.
    pub fn container(&self) -> Option<ContainerBox> {
        self.lock().container
    }

    /// Registers a callback invoked with every new value.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Removes a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|(sub, _)| *sub != id);
        state.subscribers.len() != before
    }

    /// Recomputes the factor for a resized container.
    pub fn on_resize(&self, container: ContainerBox) -> f64 {
        let value = self.calculator.compute(container);
        self.write(Some(container), value);
        value
    }

    /// Recomputes the factor after the slide content settled.
    ///
    /// Without a known container this is a no-op returning the current value.
    pub fn content_settled(&self) -> f64 {
        match self.container() {
            Some(container) => self.on_resize(container),
            None => self.current(),
        }
    }

    fn write(&self, container: Option<ContainerBox>, value: f64) {
        let subscribers: Vec<Subscriber> = {
            let mut state = self.lock();
            state.value = value;
            if container.is_some() {
                state.container = container;
            }
            state.subscribers.iter().map(|(_, s)| Arc::clone(s)).collect()
        };
        tracing::debug!(scale = value, "scale updated");
        for subscriber in subscribers {
            subscriber(value);
        }
    }

    /// The CSS custom property name carrying the factor.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Renders the factor as a CSS declaration, e.g. `--slide-scale: 2;`.
    pub fn css_declaration(&self) -> String {
        format!("{}: {};", self.variable, self.current())
    }
}

impl Default for Scaler {
    fn default() -> Self {
        Self::new(
            ScaleCalculator::default(),
            crate::config::DEFAULT_SCALE_VARIABLE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_full_hd_scales_to_two() {
        let calc = ScaleCalculator::default();
        assert_eq!(calc.compute(ContainerBox::new(1920.0, 1080.0)), 2.0);
    }

    #[test]
    fn test_huge_container_clamped_to_ceiling() {
        let calc = ScaleCalculator::default();
        assert_eq!(calc.compute(ContainerBox::new(100_000.0, 100_000.0)), 2.5);
    }

    #[test]
    fn test_wide_container_limited_by_height() {
        let calc = ScaleCalculator::default();
        assert_eq!(calc.compute(ContainerBox::new(1920.0, 540.0)), 1.0);
    }

    #[test]
    fn test_tall_container_limited_by_width() {
        let calc = ScaleCalculator::default();
        assert_eq!(calc.compute(ContainerBox::new(480.0, 2000.0)), 0.5);
    }

    #[test]
    fn test_non_finite_falls_back_to_one() {
        let calc = ScaleCalculator::default();
        assert_eq!(calc.compute(ContainerBox::new(f64::NAN, 100.0)), 1.0);
    }

    #[test]
    fn test_negative_dimensions_clamped() {
        let container = ContainerBox::new(-10.0, 100.0);
        assert_eq!(container.width, 0.0);
        assert_eq!(ScaleCalculator::default().compute(container), 0.0);
    }

    #[test]
    fn test_scaler_notifies_subscribers() {
        let scaler = Scaler::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let calls_clone = Arc::clone(&calls);
        let seen_clone = Arc::clone(&seen);
        let id = scaler.subscribe(move |value| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            seen_clone.lock().unwrap().push(value);
        });

        scaler.on_resize(ContainerBox::new(1920.0, 1080.0));
        scaler.on_resize(ContainerBox::new(1920.0, 1080.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*seen.lock().unwrap(), vec![2.0, 2.0]);

        assert!(scaler.unsubscribe(id));
        assert!(!scaler.unsubscribe(id));
        scaler.on_resize(ContainerBox::new(960.0, 540.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(scaler.current(), 1.0);
    }

    #[test]
    fn test_content_settled_reuses_last_container() {
        let scaler = Scaler::default();
        assert_eq!(scaler.content_settled(), 1.0);

        scaler.on_resize(ContainerBox::new(480.0, 270.0));
        assert_eq!(scaler.content_settled(), 0.5);
        assert_eq!(scaler.container(), Some(ContainerBox::new(480.0, 270.0)));
    }

    #[test]
    fn test_css_declaration() {
        let scaler = Scaler::default();
        scaler.on_resize(ContainerBox::new(1920.0, 1080.0));
        assert_eq!(scaler.css_declaration(), "--slide-scale: 2;");
    }

    #[test]
    fn test_separate_scalers_do_not_clash() {
        let a = Scaler::default();
        let b = Scaler::default();
        a.on_resize(ContainerBox::new(1920.0, 1080.0));
        b.on_resize(ContainerBox::new(480.0, 270.0));
        assert_eq!(a.current(), 2.0);
        assert_eq!(b.current(), 0.5);
    }

    proptest! {
        #[test]
        fn test_scaled_canvas_never_overflows(
            width in 1.0f64..20_000.0,
            height in 1.0f64..20_000.0,
        ) {
            let calc = ScaleCalculator::default();
            let scale = calc.compute(ContainerBox::new(width, height));
            prop_assert!(scale <= DEFAULT_CEILING);
            prop_assert!(fits(scale * 960.0, width));
            prop_assert!(fits(scale * 540.0, height));
        }

        #[test]
        fn test_compute_is_idempotent(
            width in 0.0f64..20_000.0,
            height in 0.0f64..20_000.0,
        ) {
            let calc = ScaleCalculator::default();
            let container = ContainerBox::new(width, height);
            prop_assert_eq!(calc.compute(container), calc.compute(container));
        }
    }
}
