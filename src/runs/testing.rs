//! Deterministic fakes for exercising sessions without a desktop

use image::{GrayImage, RgbaImage};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::session::Session;
use super::sleep::Sleeper;
use crate::desktop::{InputInjector, KeyCode, KeyDirection, Point, Rect, ScreenCapture, WindowControl, WindowTarget};
use crate::error::{AppError, Result};
use crate::locator::{ElementLocator, TextRecognizer, Variant};
use crate::models::Detection;

pub const WINDOW_ID: u32 = 42;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Click(Point),
    Key(KeyCode, KeyDirection),
}

#[derive(Default)]
struct State {
    geometry: Rect,
    events: Vec<Event>,
    captures: usize,
    sleeps: Vec<Duration>,
    activations: usize,
    releases: usize,
    detections: Vec<Detection>,
    fail_input: bool,
    fail_activation: bool,
    fail_geometry: bool,
    failing_captures: usize,
    cancel_after_sleeps: Option<(usize, Arc<AtomicBool>)>,
}

/// Builds sessions whose collaborators record into shared state
#[derive(Clone)]
pub struct Harness {
    state: Rc<RefCell<State>>,
}

impl Harness {
    pub fn new(geometry: Rect) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                geometry,
                ..State::default()
            })),
        }
    }

    /// Every recognizer pass reports these detections
    pub fn with_detections(self, detections: Vec<Detection>) -> Self {
        self.state.borrow_mut().detections = detections;
        self
    }

    pub fn with_failing_input(self) -> Self {
        self.state.borrow_mut().fail_input = true;
        self
    }

    pub fn with_failing_activation(self) -> Self {
        self.state.borrow_mut().fail_activation = true;
        self
    }

    pub fn with_failing_geometry(self) -> Self {
        self.state.borrow_mut().fail_geometry = true;
        self
    }

    /// The first `count` captures fail
    pub fn with_failing_captures(self, count: usize) -> Self {
        self.state.borrow_mut().failing_captures = count;
        self
    }

    /// Raise `flag` once `sleeps` sleeps have been recorded
    pub fn cancel_after_sleeps(self, sleeps: usize, flag: Arc<AtomicBool>) -> Self {
        self.state.borrow_mut().cancel_after_sleeps = Some((sleeps, flag));
        self
    }

    pub fn session(&self) -> Session {
        let geometry = self.state.borrow().geometry;
        Session::new(
            WindowTarget::new(WINDOW_ID, geometry),
            Box::new(FakeWindows(self.clone())),
            Box::new(FakeCapture(self.clone())),
            Box::new(FakeInput(self.clone())),
            ElementLocator::new(Box::new(FakeRecognizer(self.clone()))),
            Box::new(FakeSleeper(self.clone())),
        )
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Click(point) => Some(point),
                Event::Key(..) => None,
            })
            .collect()
    }

    pub fn captures(&self) -> usize {
        self.state.borrow().captures
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.borrow().sleeps.clone()
    }

    pub fn activations(&self) -> usize {
        self.state.borrow().activations
    }

    pub fn releases(&self) -> usize {
        self.state.borrow().releases
    }
}

struct FakeWindows(Harness);

impl WindowControl for FakeWindows {
    fn geometry(&self, window_id: u32) -> Result<Rect> {
        let state = self.0.state.borrow();
        if state.fail_geometry {
            return Err(AppError::ResourceUnavailable(format!("window {} is gone", window_id)));
        }
        Ok(state.geometry)
    }

    fn activate(&self, _window_id: u32) -> anyhow::Result<()> {
        let mut state = self.0.state.borrow_mut();
        state.activations += 1;
        if state.fail_activation {
            anyhow::bail!("window manager refused");
        }
        Ok(())
    }
}

struct FakeCapture(Harness);

impl ScreenCapture for FakeCapture {
    fn capture(&self, rect: Rect) -> anyhow::Result<RgbaImage> {
        let mut state = self.0.state.borrow_mut();
        state.captures += 1;
        if state.captures <= state.failing_captures {
            anyhow::bail!("display unavailable");
        }
        Ok(RgbaImage::new(rect.width.max(1), rect.height.max(1)))
    }
}

struct FakeInput(Harness);

impl FakeInput {
    fn record(&mut self, event: Event) -> Result<()> {
        let mut state = self.0.state.borrow_mut();
        if state.fail_input {
            return Err(AppError::InjectionFailure("device unplugged".to_string()));
        }
        state.events.push(event);
        Ok(())
    }
}

impl InputInjector for FakeInput {
    fn click_at(&mut self, point: Point) -> Result<()> {
        self.record(Event::Click(point))
    }

    fn key(&mut self, key: KeyCode, direction: KeyDirection) -> Result<()> {
        self.record(Event::Key(key, direction))
    }

    fn release(&mut self) {
        self.0.state.borrow_mut().releases += 1;
    }
}

struct FakeRecognizer(Harness);

impl TextRecognizer for FakeRecognizer {
    fn recognize(&self, _image: &GrayImage, _variant: Variant) -> anyhow::Result<Vec<Detection>> {
        Ok(self.0.state.borrow().detections.clone())
    }
}

struct FakeSleeper(Harness);

impl Sleeper for FakeSleeper {
    fn sleep(&self, duration: Duration) {
        let mut state = self.0.state.borrow_mut();
        state.sleeps.push(duration);
        if let Some((after, flag)) = &state.cancel_after_sleeps {
            if state.sleeps.len() >= *after {
                flag.store(true, Ordering::SeqCst);
            }
        }
    }
}
