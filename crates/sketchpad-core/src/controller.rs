//! Pointer gesture state machine.
//!
//! [`InteractionState::on_pointer`] is a pure transition: it reads the shape
//! list and tool settings, and returns the next state together with the
//! [`Effect`]s the owner must apply. Nothing here mutates the shape list.

use crate::shapes::{Image, Shape, ShapeId};
use crate::tools::{InProgressShape, ToolSettings};
use kurbo::Point;
use log::debug;

/// Pointer input in surface-local logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// Pointer left the surface; handled like `Up`.
    Leave,
}

/// Current gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// A shape is being drawn.
    Drawing { shape: InProgressShape },
    /// An image's resize handle is being dragged. `start` is where the drag
    /// began; it is kept for logging and does not affect the size.
    ResizingImage { image: ShapeId, start: Point },
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Change the selected image (`None` clears it).
    Select(Option<ShapeId>),
    /// Set an image's display size.
    Resize { id: ShapeId, width: f64, height: f64 },
    /// Append a finished shape.
    Commit(Shape),
    /// The surface needs repainting.
    Redraw,
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: InteractionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: InteractionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Images from topmost to bottommost.
fn images_top_down(shapes: &[Shape]) -> impl Iterator<Item = &Image> {
    shapes.iter().rev().filter_map(Shape::as_image)
}

fn find_image(shapes: &[Shape], id: ShapeId) -> Option<&Image> {
    images_top_down(shapes).find(|img| img.id == id)
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// Preview of the shape being drawn, if any.
    pub fn live_shape(&self) -> Option<Shape> {
        match self {
            InteractionState::Drawing { shape } => shape.preview(),
            _ => None,
        }
    }

    /// Advance the state machine by one pointer event.
    pub fn on_pointer(self, event: PointerEvent, shapes: &[Shape], tools: &ToolSettings) -> Transition {
        match (self, event) {
            (InteractionState::Idle, PointerEvent::Down(p)) => Self::pointer_down(p, shapes, tools),

            (InteractionState::Drawing { mut shape }, PointerEvent::Move(p)) => {
                shape.extend(p);
                Transition::to(InteractionState::Drawing { shape }).with(Effect::Redraw)
            }

            (InteractionState::Drawing { shape }, PointerEvent::Up(_) | PointerEvent::Leave) => {
                let transition = Transition::to(InteractionState::Idle);
                match shape.commit() {
                    Some(committed) => transition
                        .with(Effect::Commit(committed))
                        .with(Effect::Redraw),
                    // The live preview may have been visible.
                    None => transition.with(Effect::Redraw),
                }
            }

            (InteractionState::ResizingImage { image, start }, PointerEvent::Move(p)) => {
                let Some(target) = find_image(shapes, image) else {
                    debug!("Resize target {image} vanished, releasing");
                    return Transition::to(InteractionState::Idle);
                };
                let (width, height) = target.size_for_pointer(p);
                Transition::to(InteractionState::ResizingImage { image, start })
                    .with(Effect::Resize { id: image, width, height })
                    .with(Effect::Redraw)
            }

            (InteractionState::ResizingImage { image, start }, PointerEvent::Up(_) | PointerEvent::Leave) => {
                debug!("Released resize of {image} started at ({}, {})", start.x, start.y);
                Transition::to(InteractionState::Idle)
            }

            (state, _) => Transition::to(state),
        }
    }

    fn pointer_down(p: Point, shapes: &[Shape], tools: &ToolSettings) -> Transition {
        if let Some(img) = images_top_down(shapes).find(|img| img.handle_contains(p)) {
            return Transition::to(InteractionState::ResizingImage { image: img.id, start: p })
                .with(Effect::Select(Some(img.id)))
                .with(Effect::Redraw);
        }

        if let Some(img) = images_top_down(shapes).find(|img| img.contains(p)) {
            return Transition::to(InteractionState::Idle)
                .with(Effect::Select(Some(img.id)))
                .with(Effect::Redraw);
        }

        Transition::to(InteractionState::Drawing {
            shape: tools.begin_shape(p),
        })
        .with(Effect::Select(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;
    use crate::tools::ToolKind;
    use ::image::{DynamicImage, RgbaImage};
    use std::io::Cursor;

    fn image_shape(x: f64, y: f64, width: u32, height: u32) -> Shape {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut Cursor::new(&mut buf), ::image::ImageFormat::Png)
            .unwrap();
        Shape::Image(Image::decode(&buf, Point::new(x, y)).unwrap())
    }

    fn tools(tool: ToolKind) -> ToolSettings {
        let mut tools = ToolSettings::default();
        tools.select(tool);
        tools
    }

    /// Feed events from `Idle`, collecting every effect.
    fn run(events: &[PointerEvent], shapes: &[Shape], tools: &ToolSettings) -> (InteractionState, Vec<Effect>) {
        let mut state = InteractionState::Idle;
        let mut effects = Vec::new();
        for event in events {
            let transition = state.on_pointer(*event, shapes, tools);
            state = transition.state;
            effects.extend(transition.effects);
        }
        (state, effects)
    }

    fn commits(effects: &[Effect]) -> Vec<&Shape> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Commit(shape) => Some(shape),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_rectangle_gesture_commits_two_points() {
        let tools = tools(ToolKind::Rectangle);
        let (state, effects) = run(
            &[
                PointerEvent::Down(Point::new(10.0, 10.0)),
                PointerEvent::Move(Point::new(50.0, 10.0)),
                PointerEvent::Move(Point::new(50.0, 50.0)),
                PointerEvent::Up(Point::new(50.0, 50.0)),
            ],
            &[],
            &tools,
        );

        assert!(state.is_idle());
        let committed = commits(&effects);
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].kind(), ShapeKind::Rectangle);
        assert_eq!(committed[0].points(), vec![Point::new(10.0, 10.0), Point::new(50.0, 50.0)]);
    }

    #[test]
    fn test_click_without_move_commits_nothing() {
        let tools = tools(ToolKind::Circle);
        let (state, effects) = run(
            &[
                PointerEvent::Down(Point::new(30.0, 30.0)),
                PointerEvent::Up(Point::new(30.0, 30.0)),
            ],
            &[],
            &tools,
        );
        assert!(state.is_idle());
        assert!(commits(&effects).is_empty());
    }

    #[test]
    fn test_leave_commits_like_up() {
        let tools = tools(ToolKind::Pencil);
        let (state, effects) = run(
            &[
                PointerEvent::Down(Point::new(0.0, 0.0)),
                PointerEvent::Move(Point::new(10.0, 0.0)),
                PointerEvent::Leave,
            ],
            &[],
            &tools,
        );
        assert!(state.is_idle());
        assert_eq!(commits(&effects).len(), 1);
    }

    #[test]
    fn test_inapplicable_events_are_noops() {
        let tools = ToolSettings::default();
        for event in [
            PointerEvent::Move(Point::new(1.0, 1.0)),
            PointerEvent::Up(Point::new(1.0, 1.0)),
            PointerEvent::Leave,
        ] {
            let transition = InteractionState::Idle.on_pointer(event, &[], &tools);
            assert_eq!(transition.state, InteractionState::Idle);
            assert!(transition.effects.is_empty());
        }

        let drawing = InteractionState::Idle
            .on_pointer(PointerEvent::Down(Point::ZERO), &[], &tools)
            .state;
        let again = drawing.clone().on_pointer(PointerEvent::Down(Point::new(5.0, 5.0)), &[], &tools);
        assert_eq!(again.state, drawing);
        assert!(again.effects.is_empty());
    }

    #[test]
    fn test_down_on_image_selects_without_drawing() {
        let shapes = vec![image_shape(100.0, 100.0, 300, 200)];
        let id = shapes[0].id();
        let (state, effects) = run(&[PointerEvent::Down(Point::new(150.0, 150.0))], &shapes, &ToolSettings::default());

        assert!(state.is_idle());
        assert_eq!(effects, vec![Effect::Select(Some(id)), Effect::Redraw]);
    }

    #[test]
    fn test_down_outside_images_clears_selection() {
        let shapes = vec![image_shape(100.0, 100.0, 300, 200)];
        let (state, effects) = run(&[PointerEvent::Down(Point::new(10.0, 10.0))], &shapes, &ToolSettings::default());

        assert!(matches!(state, InteractionState::Drawing { .. }));
        assert_eq!(effects, vec![Effect::Select(None)]);
    }

    #[test]
    fn test_handle_drag_resizes_image() {
        let shapes = vec![image_shape(100.0, 100.0, 300, 200)];
        let id = shapes[0].id();
        let (state, effects) = run(
            &[
                PointerEvent::Down(Point::new(400.0, 300.0)),
                PointerEvent::Move(Point::new(420.0, 310.0)),
            ],
            &shapes,
            &ToolSettings::default(),
        );

        assert!(matches!(state, InteractionState::ResizingImage { image, .. } if image == id));
        assert!(effects.contains(&Effect::Select(Some(id))));
        assert!(effects.contains(&Effect::Resize {
            id,
            width: 320.0,
            height: 210.0
        }));
        assert!(commits(&effects).is_empty());

        let released = state.on_pointer(PointerEvent::Up(Point::new(420.0, 310.0)), &shapes, &ToolSettings::default());
        assert!(released.state.is_idle());
    }

    #[test]
    fn test_leave_during_handle_drag_releases() {
        let shapes = vec![image_shape(100.0, 100.0, 300, 200)];
        let id = shapes[0].id();
        let (state, effects) = run(
            &[
                PointerEvent::Down(Point::new(400.0, 300.0)),
                PointerEvent::Move(Point::new(450.0, 330.0)),
                PointerEvent::Leave,
            ],
            &shapes,
            &ToolSettings::default(),
        );

        assert!(state.is_idle());
        assert_eq!(
            effects.iter().rev().find(|e| matches!(e, Effect::Resize { .. })),
            Some(&Effect::Resize {
                id,
                width: 350.0,
                height: 230.0
            })
        );
        assert!(commits(&effects).is_empty());
    }

    #[test]
    fn test_handle_drag_respects_minimum_size() {
        let shapes = vec![image_shape(100.0, 100.0, 300, 200)];
        let id = shapes[0].id();
        let (_, effects) = run(
            &[
                PointerEvent::Down(Point::new(400.0, 300.0)),
                PointerEvent::Move(Point::new(90.0, 120.0)),
            ],
            &shapes,
            &ToolSettings::default(),
        );
        assert!(effects.contains(&Effect::Resize {
            id,
            width: 50.0,
            height: 50.0
        }));
    }

    #[test]
    fn test_topmost_image_wins() {
        let shapes = vec![image_shape(0.0, 0.0, 100, 100), image_shape(50.0, 50.0, 100, 100)];
        let top = shapes[1].id();
        let (_, effects) = run(&[PointerEvent::Down(Point::new(75.0, 75.0))], &shapes, &ToolSettings::default());
        assert_eq!(effects[0], Effect::Select(Some(top)));
    }

    #[test]
    fn test_handle_takes_priority_over_body() {
        // Lower image's handle sits inside the upper image's body.
        let shapes = vec![image_shape(0.0, 0.0, 100, 100), image_shape(50.0, 50.0, 200, 200)];
        let lower = shapes[0].id();
        let (state, _) = run(&[PointerEvent::Down(Point::new(100.0, 100.0))], &shapes, &ToolSettings::default());
        assert!(matches!(state, InteractionState::ResizingImage { image, .. } if image == lower));
    }

    #[test]
    fn test_live_shape_only_while_drawing() {
        let tools = tools(ToolKind::Line);
        let (state, _) = run(
            &[
                PointerEvent::Down(Point::ZERO),
                PointerEvent::Move(Point::new(20.0, 20.0)),
            ],
            &[],
            &tools,
        );
        assert_eq!(state.live_shape().map(|s| s.kind()), Some(ShapeKind::Line));
        assert!(InteractionState::Idle.live_shape().is_none());
    }
}
